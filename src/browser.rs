/// Open `url` in the default browser. Returns whether the launch succeeded;
/// a failure is reported but never fatal, the URL is already on screen.
pub fn open(url: &str) -> bool {
    match webbrowser::open(url) {
        Ok(()) => {
            tracing::debug!(url, "opened browser");
            true
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "failed to open browser");
            eprintln!("Could not open a browser ({e}). Open {url} manually.");
            false
        }
    }
}
