// ABOUTME: Test support utilities.
// ABOUTME: Tracing setup and a scripted stand-in for the PowerShell remoting client.

use std::path::{Path, PathBuf};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("rwinrm=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Shell script that speaks the remoting client's stdin protocol.
///
/// Connect requests succeed unless the password is `wrong`. Run requests
/// echo forwarded stdin, write one line to stderr, and exit with
/// `$FAKE_EXIT` (default 0). The request line is appended to
/// `$FAKE_REQUEST_LOG` when set.
#[allow(dead_code)]
const FAKE_PWSH: &str = r#"#!/bin/sh
IFS= read -r request
if [ -n "$FAKE_REQUEST_LOG" ]; then
    printf '%s\n' "$request" >> "$FAKE_REQUEST_LOG"
fi
case "$request" in
    *'"action":"connect"'*)
        case "$request" in
            *'"password":"wrong"'*)
                echo "Access is denied for wrong" >&2
                exit 1
                ;;
        esac
        exit 0
        ;;
esac
cat
echo "remote stderr" >&2
exit "${FAKE_EXIT:-0}"
"#;

/// Write the fake remoting client into `dir` and return its path.
#[cfg(unix)]
#[allow(dead_code)]
pub fn fake_pwsh(dir: &Path) -> PathBuf {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-pwsh");
    {
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(FAKE_PWSH.as_bytes()).unwrap();
        file.sync_all().unwrap();
    }
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
