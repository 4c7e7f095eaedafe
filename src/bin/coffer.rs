//! Coffer CLI: operational tooling for the vault's at-rest protection
//!
//! Usage:
//!   coffer keygen [--output <file>]
//!   coffer seal   [--key-file <file>] [--input <file>]
//!   coffer open   [--key-file <file>] [--input <file>]
//!   coffer hash-password [--input <file>]
//!   coffer verify-password --hash <phc> [--input <file>]
//!
//! Without `--key-file` the key is read from COFFER_ENCRYPTION_KEY (base64).
//! Without `--input` the value is read from stdin.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use coffer_envelope::{
    hash_password, verify_password, CipherKey, CredentialHash, EncodedBlob, SecretCipher,
};

const KEY_ENV: &str = "COFFER_ENCRYPTION_KEY";

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "keygen" => cmd_keygen(&args[2..]),
        "seal" => cmd_seal(&args[2..]),
        "open" => cmd_open(&args[2..]),
        "hash-password" => cmd_hash_password(&args[2..]),
        "verify-password" => cmd_verify_password(&args[2..]),
        "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" => {
            println!("coffer {}", coffer_envelope::VERSION);
            Ok(())
        }
        cmd => {
            eprintln!("error: unknown command '{}'", cmd);
            print_usage();
            Err("unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!(
        r#"Coffer CLI: secret sealing and password hashing

USAGE:
    coffer <COMMAND> [OPTIONS]

COMMANDS:
    keygen            Generate a new 256-bit encryption key (base64)
    seal              Encrypt a secret into a storable blob
    open              Decrypt a blob
    hash-password     Produce an Argon2id PHC hash
    verify-password   Check a password against a PHC hash

EXAMPLES:
    # Generate a key into a file readable only by its owner
    coffer keygen --output ./coffer.key

    # Seal a secret read from stdin
    echo -n 's3cr3t' | coffer seal --key-file ./coffer.key

    # Open with the key from the environment
    COFFER_ENCRYPTION_KEY=... coffer open --input blob.txt

OPTIONS:
    -h, --help       Print help
    -V, --version    Print version
"#
    );
}

#[derive(Default)]
struct Opts {
    key_file: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    hash: Option<String>,
}

fn parse_opts(args: &[String]) -> Result<Opts, Box<dyn std::error::Error>> {
    let mut opts = Opts::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--key-file" | "-k" => {
                i += 1;
                opts.key_file = Some(PathBuf::from(args.get(i).ok_or("missing key path")?));
            }
            "--input" | "-i" => {
                i += 1;
                opts.input = Some(PathBuf::from(args.get(i).ok_or("missing input path")?));
            }
            "--output" | "-o" => {
                i += 1;
                opts.output = Some(PathBuf::from(args.get(i).ok_or("missing output path")?));
            }
            "--hash" => {
                i += 1;
                opts.hash = Some(args.get(i).ok_or("missing hash")?.clone());
            }
            _ => return Err(format!("unknown option: {}", args[i]).into()),
        }
        i += 1;
    }

    Ok(opts)
}

fn load_key(opts: &Opts) -> Result<CipherKey, Box<dyn std::error::Error>> {
    let key = match &opts.key_file {
        Some(path) => CipherKey::from_key_file(path)?,
        None => CipherKey::from_env_var(KEY_ENV)?,
    };
    Ok(key)
}

fn read_input(opts: &Opts) -> Result<String, Box<dyn std::error::Error>> {
    let text = if let Some(ref path) = opts.input {
        fs::read_to_string(path)?
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    };
    Ok(text)
}

fn cmd_keygen(args: &[String]) -> CliResult {
    let opts = parse_opts(args)?;
    let key = CipherKey::generate();

    match opts.output {
        Some(path) => {
            fs::write(&path, format!("{}\n", key.to_base64().as_str()))?;

            // Restrict key file permissions (Unix only)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mut perms = fs::metadata(&path)?.permissions();
                perms.set_mode(0o600);
                fs::set_permissions(&path, perms)?;
            }

            eprintln!("Generated key: {} (mode 600)", path.display());
            eprintln!("Set COFFER_ENCRYPTION_KEY_FILE={} for the server.", path.display());
        }
        None => println!("{}", key.to_base64().as_str()),
    }

    Ok(())
}

fn cmd_seal(args: &[String]) -> CliResult {
    let opts = parse_opts(args)?;
    let cipher = SecretCipher::new(load_key(&opts)?);
    let secret = read_input(&opts)?;

    let blob = cipher.seal(&secret)?;
    println!("{}", blob.as_str());
    Ok(())
}

fn cmd_open(args: &[String]) -> CliResult {
    let opts = parse_opts(args)?;
    let cipher = SecretCipher::new(load_key(&opts)?);
    let text = read_input(&opts)?;

    let secret = cipher.open(&EncodedBlob::from_stored(text.trim()))?;
    println!("{}", secret);
    Ok(())
}

fn cmd_hash_password(args: &[String]) -> CliResult {
    let opts = parse_opts(args)?;
    let password = read_input(&opts)?;

    let hash = hash_password(password.trim_end_matches(['\r', '\n']))?;
    println!("{}", hash.as_str());
    Ok(())
}

fn cmd_verify_password(args: &[String]) -> CliResult {
    let opts = parse_opts(args)?;
    let hash = CredentialHash::from_stored(opts.hash.clone().ok_or("missing --hash")?);
    let password = read_input(&opts)?;

    if verify_password(password.trim_end_matches(['\r', '\n']), &hash) {
        println!("match");
        Ok(())
    } else {
        println!("no-match");
        Err("password does not match".into())
    }
}
