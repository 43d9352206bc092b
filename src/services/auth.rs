pub trait AdminGate: Send + Sync {
    fn has_admin_capability(&self, secret: &str) -> bool;
}

pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

impl AdminGate for SharedSecret {
    fn has_admin_capability(&self, secret: &str) -> bool {
        !self.secret.is_empty() && secret == self.secret
    }
}

pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
