use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};

const FLASH_COOKIE: &str = "flash";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Success,
    Info,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Error => "error",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Level::Success),
            "info" => Some(Level::Info),
            "error" => Some(Level::Error),
            _ => None,
        }
    }
}

/// A one-shot status message shown on the page after a redirect.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: Level::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into() }
    }

    fn encode(&self) -> String {
        urlencoding::encode(&format!("{}:{}", self.level.as_str(), self.message)).into_owned()
    }

    fn decode(raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?;
        let (level, message) = decoded.split_once(':')?;
        Some(Self { level: Level::parse(level)?, message: message.to_string() })
    }
}

/// What a mutating handler produced: where to send the browser and what to tell the user.
#[derive(Debug)]
pub struct Outcome {
    pub to: String,
    pub flash: Flash,
}

impl Outcome {
    pub fn new(to: impl Into<String>, flash: Flash) -> Self {
        Self { to: to.into(), flash }
    }

    pub fn into_response_parts(self, jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
        let cookie = Cookie::build((FLASH_COOKIE, self.flash.encode()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        (jar.add(cookie), Redirect::to(&self.to))
    }
}

/// Takes the pending message out of the jar, if any, and clears it.
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let flash = Flash::decode(cookie.value());
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_separators_in_message() {
        let flash = Flash::error("Username a:b; c=d is already taken!");
        assert_eq!(Flash::decode(&flash.encode()), Some(flash));
    }

    #[test]
    fn rejects_unknown_level() {
        assert_eq!(Flash::decode("warning%3Ahello"), None);
    }
}
