//! Interactive RSA keypair generator for evkvm subscribers.
//!
//! Not part of the publisher/subscriber CLI surface — spec marks key-pair
//! generation an external collaborator. Mirrors
//! `original_source/kybonet/crypto.py`'s `main()` prompt flow: ask for a
//! directory and a key name, refuse to clobber existing files, write the
//! private key with owner-only permissions.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use zeroize::Zeroize;

fn prompt(label: &str, default: &str) -> io::Result<String> {
    print!("{label} [{default}]: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let trimmed = line.trim();
    Ok(if trimmed.is_empty() { default.to_string() } else { trimmed.to_string() })
}

fn main() -> anyhow::Result<()> {
    let default_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

    let dir = loop {
        let input = prompt("Directory where keys'll be generated", &default_dir.display().to_string())?;
        let path = PathBuf::from(input);
        if path.is_dir() {
            break path;
        }
        eprintln!("Non-existing directory.");
    };

    let (private_path, public_path) = loop {
        let name = prompt("Name of the keys", "id_rsa")?;
        let private_path = dir.join(&name);
        let public_path = dir.join(format!("{name}.pub"));
        if private_path.exists() {
            eprintln!("File {} already exists.", private_path.display());
            continue;
        }
        if public_path.exists() {
            eprintln!("File {} already exists.", public_path.display());
            continue;
        }
        break (private_path, public_path);
    };

    let (private_key, public_key) = evkvm_core::crypto::generate_keypair()?;
    let mut private_pem = evkvm_core::crypto::private_key_to_pem(&private_key)?;
    let public_pem = evkvm_core::crypto::public_key_to_pem(&public_key)?;

    write_owner_only(&public_path, public_pem.as_bytes(), 0o444)?;
    println!("Generated public key in \"{}\".", public_path.display());

    write_owner_only(&private_path, private_pem.as_bytes(), 0o400)?;
    private_pem.zeroize();
    println!("Generated private key in \"{}\".", private_path.display());

    Ok(())
}

#[cfg(unix)]
fn write_owner_only(path: &Path, contents: &[u8], mode: u32) -> anyhow::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = OpenOptions::new().create_new(true).write(true).mode(mode).open(path)?;
    file.write_all(contents)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_owner_only(path: &Path, contents: &[u8], _mode: u32) -> anyhow::Result<()> {
    std::fs::write(path, contents)?;
    Ok(())
}
