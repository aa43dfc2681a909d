//! Server-rendered upload page

use crate::error::{DownloadError, Error};
use crate::types::{BatchReport, OutputFormat, StatusMessage};

/// Fixed message codes carried by the `notice` query parameter of `GET /`
///
/// Download failures redirect back to the form with one of these instead of
/// storing a flash message server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Batch directory or filename sanitized to nothing
    InvalidDownload,
    /// Requested artifact does not exist
    FileNotFound,
    /// Artifact exists but could not be read
    DownloadFailed,
}

impl Notice {
    /// Query parameter value
    pub fn code(&self) -> &'static str {
        match self {
            Notice::InvalidDownload => "invalid_download",
            Notice::FileNotFound => "file_not_found",
            Notice::DownloadFailed => "download_failed",
        }
    }

    /// Parse a query parameter value; unknown codes are ignored
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "invalid_download" => Some(Notice::InvalidDownload),
            "file_not_found" => Some(Notice::FileNotFound),
            "download_failed" => Some(Notice::DownloadFailed),
            _ => None,
        }
    }

    /// Notice for a failed download
    pub fn for_error(error: &Error) -> Self {
        match error {
            Error::Download(DownloadError::InvalidTarget) => Notice::InvalidDownload,
            Error::Download(DownloadError::NotFound { .. }) => Notice::FileNotFound,
            _ => Notice::DownloadFailed,
        }
    }

    /// Message shown on the page
    pub fn message(&self) -> StatusMessage {
        match self {
            Notice::InvalidDownload => {
                StatusMessage::error("Invalid filename or batch directory for download.")
            }
            Notice::FileNotFound => StatusMessage::error("File not found for download."),
            Notice::DownloadFailed => StatusMessage::error("Error during download."),
        }
    }
}

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Link to an artifact of a batch
pub fn download_href(output_subdir: &str, file_name: &str) -> String {
    format!(
        "/download-parsed/{}/{}",
        urlencoding::encode(output_subdir),
        urlencoding::encode(file_name)
    )
}

/// Render the page: status messages, the upload form, and the results of
/// `report` if one is given
pub fn render_page(messages: &[StatusMessage], report: Option<&BatchReport>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str(HEAD);
    html.push_str("<div class=\"container\">\n<h1>RAW File Converter</h1>\n");

    if !messages.is_empty() {
        html.push_str("<ul class=\"messages\">\n");
        for message in messages {
            html.push_str(&format!(
                "<li class=\"message-{}\">{}</li>\n",
                message.level.as_str(),
                escape_html(&message.text)
            ));
        }
        html.push_str("</ul>\n");
    }

    render_form(&mut html);

    if let Some(report) = report {
        if let Some(subdir) = &report.output_subdir {
            render_downloads(&mut html, subdir, &report.artifacts);
        }
        if let Some(diagnostics) = &report.diagnostics {
            html.push_str(&format!(
                "<section class=\"output\">\n<h2>Command Output</h2>\n<pre>{}</pre>\n</section>\n",
                escape_html(diagnostics)
            ));
        }
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_form(html: &mut String) {
    html.push_str(
        "<h2>1. Upload and Convert</h2>\n\
         <form method=\"post\" action=\"/upload-parse\" enctype=\"multipart/form-data\">\n\
         <label for=\"files\">RAW file(s)</label>\n\
         <input type=\"file\" name=\"files\" id=\"files\" accept=\".raw\" multiple required>\n\
         <p class=\"help\">Select several files to convert them as one batch.</p>\n\
         <label for=\"output_format\">Output format</label>\n\
         <select name=\"output_format\" id=\"output_format\">\n",
    );
    for format in OutputFormat::ALL {
        let selected = if format == OutputFormat::default() {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            format.code(),
            selected,
            escape_html(format.label())
        ));
    }
    html.push_str(
        "</select>\n\
         <label for=\"additional_args\">Additional converter arguments (optional)</label>\n\
         <input type=\"text\" name=\"additional_args\" id=\"additional_args\" placeholder=\"e.g. --noPeakPicking\">\n\
         <p class=\"help\">Input and output locations are set automatically for each batch.</p>\n\
         <input type=\"submit\" value=\"Upload and Start Conversion\">\n\
         </form>\n",
    );
}

fn render_downloads(html: &mut String, subdir: &str, artifacts: &[String]) {
    html.push_str(&format!(
        "<section class=\"downloads\">\n<h2>2. Download Results</h2>\n<p>Batch output directory: <strong>{}</strong></p>\n<ul>\n",
        escape_html(subdir)
    ));
    for name in artifacts {
        html.push_str(&format!(
            "<li><span>{}</span> <a href=\"{}\">Download</a></li>\n",
            escape_html(name),
            escape_html(&download_href(subdir, name))
        ));
    }
    html.push_str("</ul>\n</section>\n");
}

const HEAD: &str = "<!doctype html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">
<title>RAW File Converter</title>
<style>
body { font-family: Arial, sans-serif; margin: 20px; background: #f4f7f6; color: #333; line-height: 1.6; }
.container { background: #fff; padding: 25px; border-radius: 10px; max-width: 900px; margin: 30px auto; }
h1 { color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 10px; text-align: center; }
label { display: block; margin-top: 14px; font-weight: bold; }
input, select { padding: 10px; width: 100%; box-sizing: border-box; }
.messages { padding-left: 0; }
.messages li { list-style: none; padding: 10px 16px; margin-bottom: 10px; border-left: 5px solid; }
.message-success { background: #e8f5e9; border-color: #4caf50; }
.message-warning { background: #fff8e1; border-color: #ffb300; }
.message-error { background: #ffebee; border-color: #f44336; }
.help { font-size: 0.9em; color: #777; }
pre { background: #2d2d2d; color: #f0f0f0; padding: 15px; overflow-x: auto; white-space: pre-wrap; }
</style>
</head>
<body>
";
