//! Mở URL xác thực trong browser mặc định.
//!
//! Nếu không mở được (server không có GUI, SSH...), user vẫn có thể copy
//! URL được in ra terminal.

use std::process::{Command, Stdio};
use tracing::debug;

/// Các lệnh thử lần lượt để mở URL trên OS hiện tại
fn opener_commands(url: &str) -> Vec<(&'static str, Vec<String>)> {
    let url = url.to_string();

    if cfg!(target_os = "windows") {
        vec![("cmd", vec!["/c".into(), "start".into(), String::new(), url])]
    } else if cfg!(target_os = "macos") {
        vec![("open", vec![url])]
    } else {
        // WSL: wslview (gói wslu) mở browser phía Windows
        vec![
            ("xdg-open", vec![url.clone()]),
            ("wslview", vec![url.clone()]),
            ("sensible-browser", vec![url]),
        ]
    }
}

/// Linux không có display server thì không có browser để mở
fn has_display() -> bool {
    if !cfg!(target_os = "linux") {
        return true;
    }
    std::env::var_os("DISPLAY").is_some()
        || std::env::var_os("WAYLAND_DISPLAY").is_some()
        || std::env::var_os("WSL_DISTRO_NAME").is_some()
}

/// Mở URL trong browser mặc định.
///
/// Trả về `true` nếu có lệnh spawn thành công.
pub fn open_browser(url: &str) -> bool {
    if !has_display() {
        debug!("No display available, not opening a browser");
        return false;
    }

    for (program, args) in opener_commands(url) {
        let spawned = Command::new(program)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(_) => {
                debug!("Opened browser with {}", program);
                return true;
            }
            Err(e) => debug!("{} failed: {}", program, e),
        }
    }
    false
}
