use std::collections::BTreeMap;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Email,
    Password,
    ConfirmPassword,
}

/// Per-field validation messages. A field with no entry is valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors(BTreeMap<Field, &'static str>);

impl FormErrors {
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Called when the user edits `field`.
    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    fn set(&mut self, field: Field, message: &'static str) {
        self.0.insert(field, message);
    }
}

/// Something of the form `a@b.c` appears in `input`, with no whitespace
/// inside any of the three parts.
pub fn looks_like_email(input: &str) -> bool {
    let chars: Vec<char> = input.chars().collect();
    chars.iter().enumerate().any(|(at, c)| {
        if *c != '@' || at == 0 || chars[at - 1].is_whitespace() {
            return false;
        }
        let domain: Vec<char> = chars[at + 1..].iter().take_while(|c| !c.is_whitespace()).copied().collect();
        domain.iter().enumerate().any(|(i, c)| *c == '.' && i > 0 && i + 1 < domain.len())
    })
}

fn check_email(errors: &mut FormErrors, email: &str) {
    if email.is_empty() {
        errors.set(Field::Email, "Email is required");
    } else if !looks_like_email(email) {
        errors.set(Field::Email, "Email is invalid");
    }
}

fn check_password(errors: &mut FormErrors, password: &str) {
    if password.is_empty() {
        errors.set(Field::Password, "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.set(Field::Password, "Password must be at least 6 characters");
    }
}

pub fn validate_login(email: &str, password: &str) -> FormErrors {
    let mut errors = FormErrors::default();
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    errors
}

pub fn validate_signup(email: &str, password: &str, confirm: &str) -> FormErrors {
    let mut errors = validate_login(email, password);
    if confirm.is_empty() {
        errors.set(Field::ConfirmPassword, "Please confirm your password");
    } else if confirm != password {
        errors.set(Field::ConfirmPassword, "Passwords do not match");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        for ok in ["a@b.co", "alice@example.com", "first.last@mail.example.org", "x y@b.c", "a@b.c.d"] {
            assert!(looks_like_email(ok), "{} should pass", ok);
        }
        for bad in ["", "alice", "alice@", "@example.com", "alice@example", "alice@.com", "alice@example.", "a @b.c", "a@ b.c"] {
            assert!(!looks_like_email(bad), "{} should fail", bad);
        }
    }

    #[test]
    fn test_login_messages() {
        let errors = validate_login("", "");
        assert_eq!(errors.get(Field::Email), Some("Email is required"));
        assert_eq!(errors.get(Field::Password), Some("Password is required"));

        let errors = validate_login("nope", "12345");
        assert_eq!(errors.get(Field::Email), Some("Email is invalid"));
        assert_eq!(errors.get(Field::Password), Some("Password must be at least 6 characters"));

        assert!(validate_login("alice@example.com", "123456").is_empty());
    }

    #[test]
    fn test_signup_confirmation() {
        let errors = validate_signup("alice@example.com", "secret1", "");
        assert_eq!(errors.get(Field::ConfirmPassword), Some("Please confirm your password"));
        assert_eq!(errors.get(Field::Password), None);

        let errors = validate_signup("alice@example.com", "secret1", "secret2");
        assert_eq!(errors.get(Field::ConfirmPassword), Some("Passwords do not match"));

        assert!(validate_signup("alice@example.com", "secret1", "secret1").is_empty());
    }

    #[test]
    fn test_clear_only_touches_edited_field() {
        let mut errors = validate_signup("", "", "");
        errors.clear(Field::Email);
        assert_eq!(errors.get(Field::Email), None);
        assert_eq!(errors.get(Field::Password), Some("Password is required"));
        assert_eq!(errors.get(Field::ConfirmPassword), Some("Please confirm your password"));

        errors.clear(Field::Password);
        errors.clear(Field::ConfirmPassword);
        assert!(errors.is_empty());
    }
}
