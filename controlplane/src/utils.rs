// Returns true if the provided error is a not found error.
pub fn check_if_not_found_err(error: &kube::Error) -> bool {
    if let kube::Error::Api(response) = error {
        if response.code == 404 {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: "Whatever".to_string(),
            code,
        })
    }

    #[test]
    fn detects_not_found() {
        assert!(check_if_not_found_err(&api_error(404)));
        assert!(!check_if_not_found_err(&api_error(409)));
        assert!(!check_if_not_found_err(&api_error(500)));
        assert!(!check_if_not_found_err(&kube::Error::Service(
            "connection refused".into()
        )));
    }
}
