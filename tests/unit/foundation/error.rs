use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MipviewError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MipviewError::source("x")
            .to_string()
            .contains("source error:")
    );
    assert!(
        MipviewError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        MipviewError::config("x")
            .to_string()
            .contains("config error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MipviewError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
