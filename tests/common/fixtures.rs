//! Converter scripts, configs and request builders

use axum::body::Body;
use axum::extract::Request;
use axum::http::header;
use rawconv::Config;
use rawconv::config::StorageConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Stand-in converter: parses `-i`/`-d`, `-o` and `-f` and writes one
/// `<stem>.mzML` per input into the output directory
pub const CONVERTING_SCRIPT: &str = r#"#!/bin/sh
input=""
out=""
fmt=""
while [ $# -gt 0 ]; do
  case "$1" in
    -i|-d) input="$2"; shift 2 ;;
    -o) out="$2"; shift 2 ;;
    -f) fmt="$2"; shift 2 ;;
    *) echo "extra argument: $1"; shift ;;
  esac
done
echo "converting $input with format $fmt"
if [ "$fmt" = "0" ]; then
  exit 0
fi
if [ -d "$input" ]; then
  for f in "$input"/*.raw; do
    stem=$(basename "$f" .raw)
    printf 'mzml:%s' "$stem" > "${out}${stem}.mzML"
  done
else
  stem=$(basename "$input" .raw)
  printf 'mzml:%s' "$stem" > "${out}${stem}.mzML"
fi
"#;

/// Stand-in converter that reports an error and exits with 2
pub const FAILING_SCRIPT: &str = "#!/bin/sh\necho 'cannot read RAW header' >&2\nexit 2\n";

/// Stand-in converter that never finishes on its own
pub const HANGING_SCRIPT: &str = "#!/bin/sh\nsleep 30\n";

const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

/// Write an executable script into `dir`
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Config with roots in `temp` that runs `executable` directly
pub fn config_for(temp: &TempDir, executable: PathBuf) -> Config {
    let mut config = Config {
        storage: StorageConfig {
            upload_dir: temp.path().join("uploads"),
            converted_dir: temp.path().join("converted"),
        },
        ..Default::default()
    };
    config.converter.executable = executable;
    config.converter.launcher = None;
    config.converter.timeout = Duration::from_secs(10);
    config
}

/// Multipart upload with file parts under `files` and plain text fields
pub fn upload_request(uri: &str, files: &[(&str, &[u8])], fields: &[(&str, &str)]) -> Request {
    let mut body = Vec::new();
    for (name, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
