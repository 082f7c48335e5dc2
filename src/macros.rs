/// Declares a closed sum type of variants and wires it into the container.
///
/// Each arm holds one slot: a `Variant` held by value, or `Shared<T>` for a
/// variant held through a shared handle. Arms are registered in declaration
/// order, and duplicate discriminators fail to compile.
///
/// ```
/// use polyjson::{Poly, Shared, Variant, poly_enum};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct Circle {
///     radius: f64,
/// }
///
/// impl Variant for Circle {
///     const TYPE_NAME: &'static str = "circle";
/// }
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct Label {
///     text: String,
/// }
///
/// impl Variant for Label {
///     const TYPE_NAME: &'static str = "label";
/// }
///
/// poly_enum! {
///     #[derive(Clone, Debug, PartialEq)]
///     pub enum Shape {
///         Circle(Circle),
///         Label(Shared<Label>),
///     }
/// }
///
/// let shape: Poly<Shape> = Poly::from_slice(br#"{"type":"circle","radius":2.0}"#).unwrap();
/// assert_eq!(shape.value(), Some(&Shape::Circle(Circle { radius: 2.0 })));
/// ```
///
/// Two arms whose variants share a discriminator are rejected at compile time:
///
/// ```compile_fail
/// use polyjson::{Variant, poly_enum};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Circle {}
///
/// impl Variant for Circle {
///     const TYPE_NAME: &'static str = "shape";
/// }
///
/// #[derive(Serialize, Deserialize)]
/// struct Square {}
///
/// impl Variant for Square {
///     const TYPE_NAME: &'static str = "shape";
/// }
///
/// poly_enum! {
///     enum Shape {
///         Circle(Circle),
///         Square(Square),
///     }
/// }
/// ```
#[macro_export]
macro_rules! poly_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$arm_meta:meta])*
                $arm:ident($slot:ty)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$arm_meta])*
                $arm($slot),
            )+
        }

        const _: () = $crate::api::assert_unique_names(&[
            $(<<$slot as $crate::api::Slot>::Target as $crate::api::Variant>::TYPE_NAME,)+
        ]);

        impl $crate::api::PolyValue for $name {
            fn type_name(&self) -> ::core::option::Option<&'static str> {
                match self {
                    $(Self::$arm(slot) => ::core::option::Option::Some($crate::api::Slot::type_name(slot)),)+
                }
            }

            fn encode_fields(
                &self,
            ) -> ::core::result::Result<
                ::core::option::Option<$crate::__private::Value>,
                $crate::__private::JsonError,
            > {
                match self {
                    $(Self::$arm(slot) => $crate::api::Slot::encode(slot),)+
                }
            }

            fn variants() -> &'static $crate::api::VariantSet<Self> {
                static VARIANTS: ::std::sync::OnceLock<$crate::api::VariantSet<$name>> =
                    ::std::sync::OnceLock::new();
                VARIANTS.get_or_init(|| {
                    $crate::api::VariantSet::builder()
                        $(.variant::<$slot>())+
                        .build()
                })
            }

            fn is_null(&self) -> bool {
                match self {
                    $(Self::$arm(slot) => $crate::api::Slot::is_null(slot),)+
                }
            }
        }

        $(
            impl $crate::api::Member<$slot> for $name {
                fn wrap(slot: $slot) -> Self {
                    Self::$arm(slot)
                }

                #[allow(unreachable_patterns)]
                fn slot_mut(&mut self) -> ::core::option::Option<&mut $slot> {
                    match self {
                        Self::$arm(slot) => ::core::option::Option::Some(slot),
                        _ => ::core::option::Option::None,
                    }
                }
            }

            impl ::core::convert::From<$slot> for $name {
                fn from(slot: $slot) -> Self {
                    Self::$arm(slot)
                }
            }
        )+
    };
}
