//! Builder macro for tracer configuration types.

/// Generate a builder struct and implementation for a configuration type.
///
/// The configuration type must implement `Default` and provide a
/// `fn validate(&self) -> Result<(), BuilderError>` method. The macro generates:
/// - A builder struct with every field wrapped in `Option`
/// - Setter methods for each field (all accept `impl Into<T>`)
/// - A `build()` method that fills defaults and then validates
/// - A `builder()` method on the config type
///
/// # Field categories
///
/// - `defaulted { field: Type }`: unset fields take `Config::default().field`
/// - `optional { field: Type }`: for `Option<Type>` config fields; setting one
///   stores `Some(value)`, leaving it unset keeps the default
macro_rules! impl_builder {
    (
        $Config:ident, $Builder:ident {
            defaulted { $( $def_field:ident : $def_ty:ty ),* $(,)? }
            optional { $( $opt_field:ident : $opt_ty:ty ),* $(,)? }
        }
    ) => {
        #[doc = concat!("Builder for [`", stringify!($Config), "`].")]
        #[derive(Debug, Default)]
        pub struct $Builder {
            $( $def_field: Option<$def_ty>, )*
            $( $opt_field: Option<$opt_ty>, )*
        }

        impl $Config {
            pub fn builder() -> $Builder {
                $Builder::default()
            }
        }

        impl $Builder {
            $(
                pub fn $def_field(mut self, value: impl Into<$def_ty>) -> Self {
                    self.$def_field = Some(value.into());
                    self
                }
            )*

            $(
                pub fn $opt_field(mut self, value: impl Into<$opt_ty>) -> Self {
                    self.$opt_field = Some(value.into());
                    self
                }
            )*

            pub fn build(self) -> Result<$Config, $crate::error::BuilderError> {
                let defaults = $Config::default();
                let config = $Config {
                    $( $def_field: self.$def_field.unwrap_or(defaults.$def_field), )*
                    $( $opt_field: self.$opt_field.or(defaults.$opt_field), )*
                };
                config.validate()?;
                Ok(config)
            }
        }
    };
}

pub(crate) use impl_builder;
