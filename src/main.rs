// rsa-messenger Command Line
// keyGen, sendKey, getKey, sendMsg, and getMsg against the shared key server

use std::process;

use anyhow::{bail, Context, Result};

use rsa_messenger::net::models::{self, Key, Message};
use rsa_messenger::net::KeyServerClient;
use rsa_messenger::rsa::codec;
use rsa_messenger::rsa::keygen::{self, KeygenConfig, PrivateKey, PublicKey};
use rsa_messenger::rsa::transform;
use rsa_messenger::store::KeyStore;

const USAGE: &str = "\
usage: rsa-messenger <command> [arguments]

  keyGen <bits>            generate a key pair into public.key and private.key
  sendKey <email>          register the local public key for <email> on the server
  getKey <email>           fetch <email>'s public key into <email>.key
  sendMsg <email> <text>   encrypt <text> for <email> and leave it on the server
  getMsg <email>           fetch and decrypt the message waiting for <email>";

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: &[String]) -> Result<()> {
    let (command, rest) = match args.split_first() {
        Some(split) => split,
        None => bail!("missing command\n{}", USAGE),
    };

    match command.as_str() {
        "keyGen" => key_gen(rest),
        "sendKey" => send_key(rest),
        "getKey" => get_key(rest),
        "sendMsg" => send_msg(rest),
        "getMsg" => get_msg(rest),
        other => bail!("unknown command {:?}\n{}", other, USAGE),
    }
}

/// Generate a key pair and write public.key and private.key.
fn key_gen(args: &[String]) -> Result<()> {
    let bits = match args {
        [bits] => bits
            .parse::<u64>()
            .with_context(|| format!("key size {:?} is not a number", bits))?,
        _ => bail!("usage: rsa-messenger keyGen <bits>"),
    };

    let pair = keygen::generate(bits, &KeygenConfig::default())?;

    let store = KeyStore::current_dir();
    store.save_public(&Key {
        email: String::new(),
        key: pair.public.to_blob(),
    })?;
    store.save_private(&models::PrivateKey {
        email: Vec::new(),
        key: pair.private.to_blob(),
    })?;
    Ok(())
}

/// Claim an address: publish the local public key under it and remember
/// it in the private record.
fn send_key(args: &[String]) -> Result<()> {
    let email = single_email(args, "sendKey")?;

    let store = KeyStore::current_dir();
    let mut record = store
        .load_public()
        .context("no local key pair; run keyGen first")?;
    record.email = email.to_string();

    let client = KeyServerClient::from_env()?;
    client.put_key(&record)?;

    store.save_public(&record)?;
    store.register_address(email)?;
    println!("Key saved");
    Ok(())
}

/// Fetch a correspondent's public key into <email>.key.
fn get_key(args: &[String]) -> Result<()> {
    let email = single_email(args, "getKey")?;

    let client = KeyServerClient::from_env()?;
    let record = client.get_key(email)?;
    KeyStore::current_dir().save_contact(email, &record)?;
    Ok(())
}

/// Encrypt a message under the correspondent's key and send it.
fn send_msg(args: &[String]) -> Result<()> {
    let (email, text) = match args {
        [email, text] => (email, text),
        _ => bail!("usage: rsa-messenger sendMsg <email> <text>"),
    };

    let contact = KeyStore::current_dir()
        .load_contact(email)
        .with_context(|| format!("no key on file for {}; run getKey first", email))?;
    let public = PublicKey::from_blob(&contact.key)?;

    let cipher = transform::encrypt(text.as_bytes(), &public.e, &public.n)?;

    let client = KeyServerClient::from_env()?;
    client.put_message(&Message {
        email: email.to_string(),
        content: codec::encode_value(&cipher),
    })?;
    println!("Message written");
    Ok(())
}

/// Fetch the message waiting for an address this machine holds the
/// private key for, and print the decrypted text.
fn get_msg(args: &[String]) -> Result<()> {
    let email = single_email(args, "getMsg")?;

    let store = KeyStore::current_dir();
    let record = store
        .load_private()
        .context("no local key pair; run keyGen first")?;
    if !record.email.iter().any(|known| known == email) {
        bail!("no private key registered for {} on this machine", email);
    }
    let private = PrivateKey::from_blob(&record.key)?;

    let client = KeyServerClient::from_env()?;
    let message = client.get_message(email)?;

    let cipher = codec::decode_value(&message.content)?;
    let plain = transform::decrypt(&cipher, &private.d, &private.n);
    let text = String::from_utf8(plain).context("decrypted message is not valid UTF-8")?;
    println!("{}", text);
    Ok(())
}

fn single_email<'a>(args: &'a [String], command: &str) -> Result<&'a str> {
    match args {
        [email] => Ok(email),
        _ => bail!("usage: rsa-messenger {} <email>", command),
    }
}
