

/// Url of the running bookshelf service, `BOOKSHELF_URL` overrides the local default
#[cfg(all(test, any(feature = "system_tests", feature = "load_tests")))]
fn service_url() -> String {
    std::env::var("BOOKSHELF_URL").unwrap_or("http://127.0.0.1:8080".to_string())
}
