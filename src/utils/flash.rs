use actix_web::cookie::Cookie;
use actix_web::{HttpRequest, HttpResponse, http};
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const FLASH_COOKIE: &str = "flash";

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    AllFieldsRequired,
    InvalidUrl,
    InvalidToken,
    BotNotFound,
    ProcessingError,
}

impl Flash {
    const ALL: [Flash; 5] = [
        Flash::AllFieldsRequired,
        Flash::InvalidUrl,
        Flash::InvalidToken,
        Flash::BotNotFound,
        Flash::ProcessingError,
    ];

    fn code(self) -> &'static str {
        match self {
            Flash::AllFieldsRequired => "all_fields_required",
            Flash::InvalidUrl => "invalid_url",
            Flash::InvalidToken => "invalid_token",
            Flash::BotNotFound => "bot_not_found",
            Flash::ProcessingError => "processing_error",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::AllFieldsRequired => "All fields are required",
            Flash::InvalidUrl => "Invalid target URL",
            Flash::InvalidToken => "Invalid bot token",
            Flash::BotNotFound => "Bot not found",
            Flash::ProcessingError => "Error processing bot information",
        }
    }
}

type FlashMac = Hmac<Sha256>;

fn mac_for(secret: &str, code: &str) -> FlashMac {
    let mut mac =
        FlashMac::new_from_slice(secret.as_bytes()).expect("HMAC accepts arbitrary key size");
    mac.update(code.as_bytes());
    mac
}

/// Sign a flash code with the session secret
fn sign(secret: &str, code: &str) -> String {
    hex::encode(mac_for(secret, code).finalize().into_bytes())
}

fn verify(secret: &str, code: &str, signature: &str) -> bool {
    match hex::decode(signature) {
        Ok(signature) => mac_for(secret, code).verify_slice(&signature).is_ok(),
        Err(_) => false,
    }
}

pub fn flash_cookie(secret: &str, flash: Flash) -> Cookie<'static> {
    let code = flash.code();
    Cookie::build(FLASH_COOKIE, format!("{}.{}", code, sign(secret, code)))
        .path("/")
        .http_only(true)
        .finish()
}

pub fn clear_flash_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Read the pending flash, ignoring anything not signed with `secret`.
pub fn read_flash(req: &HttpRequest, secret: &str) -> Option<Flash> {
    let cookie = req.cookie(FLASH_COOKIE)?;
    let (code, signature) = cookie.value().split_once('.')?;
    if !verify(secret, code, signature) {
        return None;
    }
    Flash::ALL.into_iter().find(|flash| flash.code() == code)
}

/// `302` to `location` carrying a flash message.
pub fn redirect_with_flash(location: &str, secret: &str, flash: Flash) -> HttpResponse {
    HttpResponse::Found()
        .append_header((http::header::LOCATION, location.to_string()))
        .cookie(flash_cookie(secret, flash))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn signed_flash_round_trips() {
        let cookie = flash_cookie("secret", Flash::InvalidToken);
        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(read_flash(&req, "secret"), Some(Flash::InvalidToken));
    }

    #[test]
    fn flash_signed_with_another_secret_is_ignored() {
        let cookie = flash_cookie("other", Flash::BotNotFound);
        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(read_flash(&req, "secret"), None);

        let forged = Cookie::new(FLASH_COOKIE, "bot_not_found.deadbeef");
        let req = TestRequest::default().cookie(forged).to_http_request();
        assert_eq!(read_flash(&req, "secret"), None);

        let not_hex = Cookie::new(FLASH_COOKIE, "bot_not_found.zz");
        let req = TestRequest::default().cookie(not_hex).to_http_request();
        assert_eq!(read_flash(&req, "secret"), None);
    }

    #[test]
    fn signature_is_bound_to_the_code() {
        let signature = sign("secret", "invalid_token");
        assert!(verify("secret", "invalid_token", &signature));
        assert!(!verify("secret", "bot_not_found", &signature));
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn redirect_sets_location_and_cookie() {
        let resp = redirect_with_flash("/", "secret", Flash::AllFieldsRequired);
        assert_eq!(resp.status(), http::StatusCode::FOUND);
        assert_eq!(resp.headers().get(http::header::LOCATION).unwrap(), "/");
        assert!(resp.cookies().any(|c| c.name() == FLASH_COOKIE));
    }
}
