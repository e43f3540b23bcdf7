use voteguard::{KeyStore, DEFAULT_KEY_BITS, PRIVATE_KEY_ENV, PUBLIC_KEY_ENV};

pub fn command_keygen(matches: &clap::ArgMatches) {
    let bits = match matches.value_of("bits") {
        Some(bits) => match bits.parse::<u64>() {
            Ok(bits) => bits,
            Err(_) => {
                eprintln!("voteguard keygen: --bits must be an integer");
                std::process::exit(1);
            }
        },
        None => DEFAULT_KEY_BITS,
    };

    let keystore = match KeyStore::generate(bits) {
        Ok(keystore) => keystore,
        Err(e) => {
            eprintln!("voteguard keygen: {}", e);
            std::process::exit(1);
        }
    };

    let (encoded_public, encoded_private) = keystore.export();

    println!("Copy the following lines into the environment of the tallying service:");
    println!("{}={}", PUBLIC_KEY_ENV, encoded_public);
    println!("{}={}", PRIVATE_KEY_ENV, encoded_private);
}
