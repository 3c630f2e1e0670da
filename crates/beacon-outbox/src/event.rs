use std::sync::LazyLock;

use regex::Regex;

/// A business occurrence recorded in the outbox.
///
/// Each event names its own type; the outbox derives the stored `event_type`
/// from that name with [`to_event_type`]. Use [`domain_event!`](crate::domain_event)
/// to implement it for `Serialize` structs.
pub trait DomainEvent: Send + Sync {
    /// Type name in concatenated capitalized words (e.g. `UserCreated`).
    fn type_name(&self) -> &'static str;

    /// JSON text of the event body.
    fn payload(&self) -> Result<String, serde_json::Error>;

    fn event_type(&self) -> String {
        to_event_type(self.type_name())
    }
}

/// Implement [`DomainEvent`] for one or more `Serialize` types, using the
/// type identifier as the type name.
#[macro_export]
macro_rules! domain_event {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $crate::DomainEvent for $ty {
                fn type_name(&self) -> &'static str {
                    stringify!($ty)
                }

                fn payload(&self) -> ::std::result::Result<String, $crate::__private::serde_json::Error> {
                    $crate::__private::serde_json::to_string(self)
                }
            }
        )+
    };
}

static CAPITALIZED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid capitalized word pattern"));

static LOWER_THEN_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid case boundary pattern"));

/// Normalize a type name into the outbox `event_type` (`UserCreated` → `user_created`).
///
/// Two passes, then lowercase:
/// 1. `(.)([A-Z][a-z]+)` → `${1}_${2}`: separate every capitalized word from
///    the character before it.
/// 2. `([a-z0-9])([A-Z])` → `${1}_${2}`: separate a lowercase letter or digit
///    from a following uppercase letter.
///
/// Already snake_cased input comes back unchanged.
pub fn to_event_type(type_name: &str) -> String {
    let words = CAPITALIZED_WORD.replace_all(type_name, "${1}_${2}");
    LOWER_THEN_UPPER
        .replace_all(&words, "${1}_${2}")
        .to_lowercase()
}
