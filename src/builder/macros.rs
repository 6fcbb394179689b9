//! Macros for ergonomic machine construction.

/// Declare a unit-variant state enum and implement `State` for it,
/// including its place in the hierarchy.
///
/// # Example
///
/// ```
/// use stopwatch_hsm::core::State;
/// use stopwatch_hsm::state_enum;
///
/// state_enum! {
///     pub enum Connection {
///         Online,
///         Syncing,
///         Idle,
///         Closed,
///     }
///     children: { Online => [Syncing, Idle] }
///     initial: { Online => Syncing }
///     final: [Closed]
/// }
///
/// assert_eq!(Connection::Idle.parent(), Some(Connection::Online));
/// assert_eq!(Connection::Online.initial_leaf(), Connection::Syncing);
/// assert!(Connection::Closed.is_final());
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(children: { $($parent:ident => [$($child:ident),* $(,)?]),* $(,)? })?
        $(initial: { $($composite:ident => $initial:ident),* $(,)? })?
        $(final: [$($final:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            #[allow(unreachable_patterns)]
            fn parent(&self) -> Option<Self> {
                match self {
                    $($($(Self::$child => Some(Self::$parent),)*)*)?
                    _ => None,
                }
            }

            #[allow(unreachable_patterns)]
            fn initial_child(&self) -> Option<Self> {
                match self {
                    $($(Self::$composite => Some(Self::$initial),)*)?
                    _ => None,
                }
            }

            #[allow(unreachable_patterns)]
            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }
        }
    };
}
