//! Redirect page for the browser target.

use crate::descriptor::escape_attribute;

/// Name of the page written into the browser platform's www directory.
pub const REDIRECT_FILE_NAME: &str = "index.html";

/// A minimal HTML document that immediately navigates to `url`.
pub fn redirect_page(url: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n  <head>\n    <meta http-equiv=\"refresh\" content=\"0;URL={}\">\n  </head>\n  <body></body>\n</html>\n",
        escape_attribute(url)
    )
}
