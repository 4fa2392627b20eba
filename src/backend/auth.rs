use chrono::Utc;
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
}

// Mock credential boundary: any non-empty pair is accepted and nothing is
// verified or stored. A real deployment delegates login and signup to an
// identity provider here.
#[derive(Default)]
pub struct AuthState {
    user: Option<User>,
}

impl AuthState {
    pub fn new() -> Self {
        Self { user: None }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn login(&mut self, email: &str, password: &str) -> bool {
        self.start_session(email, password)
    }

    pub fn signup(&mut self, email: &str, password: &str) -> bool {
        self.start_session(email, password)
    }

    pub fn logout(&mut self) {
        self.user = None;
    }

    fn start_session(&mut self, email: &str, password: &str) -> bool {
        if email.is_empty() || password.is_empty() {
            return false;
        }
        self.user = Some(User { id: fresh_id(), email: email.to_string() });
        true
    }
}

fn fresh_id() -> String {
    let suffix: u16 = rand::thread_rng().gen();
    format!("{}{:04x}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credentials_are_rejected() {
        let cases = [("", ""), ("a@b.co", ""), ("", "secret1")];
        for (email, password) in cases {
            let mut auth = AuthState::new();
            assert!(!auth.login(email, password));
            assert!(!auth.signup(email, password));
            assert!(auth.user().is_none());
            assert!(!auth.is_authenticated());
        }
    }

    #[test]
    fn test_login_and_signup_create_user() {
        let mut auth = AuthState::new();
        assert!(auth.login("alice@example.com", "hunter22"));
        assert!(auth.is_authenticated());
        assert_eq!(auth.user().unwrap().email, "alice@example.com");
        assert!(!auth.user().unwrap().id.is_empty());

        let mut auth = AuthState::new();
        assert!(auth.signup("bob@example.com", "x"));
        assert_eq!(auth.user().unwrap().email, "bob@example.com");
    }

    #[test]
    fn test_failed_login_keeps_existing_user() {
        let mut auth = AuthState::new();
        assert!(auth.login("alice@example.com", "hunter22"));
        assert!(!auth.login("", "hunter22"));
        assert_eq!(auth.user().unwrap().email, "alice@example.com");
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut auth = AuthState::new();
        auth.logout();
        assert!(!auth.is_authenticated());

        auth.login("alice@example.com", "hunter22");
        auth.logout();
        auth.logout();
        assert!(!auth.is_authenticated());
    }
}
