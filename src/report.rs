use sqip_triangle::{ENV_VENDOR_DIR, Platform, TriangleError};

pub fn report_error(err: &TriangleError) {
    match err {
        TriangleError::BinaryNotFound { bundled, .. } => {
            eprintln!("{err}");
            eprintln!();
            match bundled {
                Some(path) => eprintln!("Expected a bundled binary at {}", path.display()),
                None => eprintln!("No bundled binary is shipped for {}", Platform::current()),
            }
            eprintln!("To fix this, either:");
            eprintln!("  - Install triangle so it is on your PATH (https://github.com/esimov/triangle)");
            eprintln!("  - Or point --vendor-dir / {ENV_VENDOR_DIR} at a directory with <os>-<arch>/triangle");
        }
        _ => {
            eprintln!("{err}");
        }
    }
}
