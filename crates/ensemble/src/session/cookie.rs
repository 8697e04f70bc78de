use axum::http::header::COOKIE;
use axum::http::HeaderMap;

/// Attributes applied to the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub max_age_secs: i64,
}

impl CookieSettings {
    pub fn set_header(&self, value: &str) -> String {
        self.render(value, self.max_age_secs)
    }

    pub fn clear_header(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut header = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// Finds a cookie by name across every `Cookie` header on the request.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
