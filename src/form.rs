//! Form error mapping and client-side validation rules.
//!
//! Server validation errors arrive as a `{ field_name: message }` object.
//! [`FieldErrors`] keeps them in name order so mapping onto a form's slots
//! is deterministic; [`FieldErrors::map_to`] resolves names into a typed
//! [`FormField`] enum and hands back whatever the form does not know.

use std::collections::BTreeMap;

use crate::types::Money;

/// Server-reported per-field messages, ordered by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// No errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the `data` object of a validation error body. Non-string and
    /// empty messages are skipped.
    pub fn from_payload(data: &serde_json::Value) -> Self {
        let Some(obj) = data.as_object() else {
            return Self::default();
        };
        let fields = obj
            .iter()
            .filter_map(|(name, value)| {
                let msg = value.as_str()?;
                (!msg.is_empty()).then(|| (name.clone(), msg.to_string()))
            })
            .collect();
        Self(fields)
    }

    /// Sets the message for `field`, replacing any previous one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Message for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// True when no field has a message.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with a message.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `(field, message)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Splits messages into the form's slots and leftover names.
    pub fn map_to<F: FormField>(&self) -> MappedErrors<F> {
        let mut mapped = MappedErrors {
            slots: BTreeMap::new(),
            unknown: Vec::new(),
        };
        for (name, message) in &self.0 {
            match F::from_name(name) {
                Some(field) => {
                    mapped.slots.insert(field, message.clone());
                }
                None => mapped.unknown.push(name.clone()),
            }
        }
        mapped
    }
}

/// Result of [`FieldErrors::map_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedErrors<F: Ord> {
    /// Messages for fields the form has.
    pub slots: BTreeMap<F, String>,
    /// Field names the form does not have.
    pub unknown: Vec<String>,
}

impl<F: Ord> MappedErrors<F> {
    /// Message mapped onto `field`.
    pub fn message(&self, field: &F) -> Option<&str> {
        self.slots.get(field).map(String::as_str)
    }
}

/// A form's error slots, addressable by server field name.
pub trait FormField: Copy + Ord {
    /// Slot for a server field name.
    fn from_name(name: &str) -> Option<Self>;
    /// Server field name of this slot.
    fn name(self) -> &'static str;
}

macro_rules! form_fields {
    ($(#[$meta:meta])* $ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $ty {
            $(#[doc = concat!("`", $name, "` field.")] $variant),+
        }

        impl FormField for $ty {
            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some($ty::$variant),)+
                    _ => None,
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }
    };
}

form_fields!(
    /// Login form.
    LoginField { Email => "email", Password => "password" }
);
form_fields!(
    /// Registration form.
    RegisterField {
        Email => "email",
        Password => "password",
        ConfirmPassword => "confirm_password",
    }
);
form_fields!(
    /// Change-password form.
    PasswordField {
        Password => "password",
        NewPassword => "new_password",
        ConfirmPassword => "confirm_password",
    }
);
form_fields!(
    /// Profile form.
    ProfileField {
        Name => "name",
        Phone => "phone",
        Address => "address",
        DateOfBirth => "date_of_birth",
        Avatar => "avatar",
    }
);
form_fields!(
    /// Price range filter.
    PriceField { PriceMin => "price_min", PriceMax => "price_max" }
);

const MIN_LEN: usize = 6;
const MAX_LEN: usize = 160;

/// Client-side rule violation on a single field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Field left blank.
    #[error("{field} is required")]
    Required {
        /// Field name.
        field: &'static str,
    },
    /// Too short or too long, counted in characters.
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        /// Field name.
        field: &'static str,
        /// Shortest accepted length.
        min: usize,
        /// Longest accepted length.
        max: usize,
    },
    /// Not shaped like `local@host.tld`.
    #[error("email is not valid")]
    InvalidEmail,
    /// Confirmation differs from the password.
    #[error("passwords do not match")]
    ConfirmMismatch,
    /// Missing, unparsable or inverted price bounds.
    #[error("enter a valid price range")]
    PriceRange,
}

impl ValidationError {
    /// Server-style field name this error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required { field } | ValidationError::Length { field, .. } => *field,
            ValidationError::InvalidEmail => "email",
            ValidationError::ConfirmMismatch => "confirm_password",
            ValidationError::PriceRange => "price_min",
        }
    }
}

/// Collects every violation into [`FieldErrors`], first error per field wins.
pub fn collect(errors: &[ValidationError]) -> FieldErrors {
    let mut out = FieldErrors::new();
    for err in errors {
        if out.get(err.field()).is_none() {
            out.insert(err.field(), err.to_string());
        }
    }
    out
}

/// Email rules: required, 6 to 160 characters, a single `@` and a dotted host.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required { field: "email" });
    }
    let len = email.chars().count();
    if !(MIN_LEN..=MAX_LEN).contains(&len) {
        return Err(ValidationError::Length {
            field: "email",
            min: MIN_LEN,
            max: MAX_LEN,
        });
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'));
    if local.is_empty() || domain.contains('@') || !domain_ok || email.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Password rules for `field`: required, 6 to 160 characters.
pub fn validate_password(field: &'static str, password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Required { field });
    }
    let len = password.chars().count();
    if !(MIN_LEN..=MAX_LEN).contains(&len) {
        return Err(ValidationError::Length {
            field,
            min: MIN_LEN,
            max: MAX_LEN,
        });
    }
    Ok(())
}

/// Login form rules.
pub fn validate_login(email: &str, password: &str) -> Vec<ValidationError> {
    [validate_email(email), validate_password("password", password)]
        .into_iter()
        .filter_map(Result::err)
        .collect()
}

/// Registration form rules.
pub fn validate_register(email: &str, password: &str, confirm_password: &str) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = [
        validate_email(email),
        validate_password("password", password),
        validate_password("confirm_password", confirm_password),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect();
    if !confirm_password.is_empty() && password != confirm_password {
        errors.push(ValidationError::ConfirmMismatch);
    }
    errors
}

/// Change-password form rules.
pub fn validate_password_change(current: &str, new_password: &str, confirm_password: &str) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = [
        validate_password("password", current),
        validate_password("new_password", new_password),
        validate_password("confirm_password", confirm_password),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect();
    if !confirm_password.is_empty() && new_password != confirm_password {
        errors.push(ValidationError::ConfirmMismatch);
    }
    errors
}

/// Parses the price filter inputs. Both must be present and `min <= max`.
pub fn validate_price_range(price_min: &str, price_max: &str) -> Result<(Money, Money), ValidationError> {
    let min = price_min.trim().parse::<Money>().map_err(|_| ValidationError::PriceRange)?;
    let max = price_max.trim().parse::<Money>().map_err(|_| ValidationError::PriceRange)?;
    if min > max {
        return Err(ValidationError::PriceRange);
    }
    Ok((min, max))
}
