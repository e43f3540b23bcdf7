use voteguard::{
    generate_credential, split_credential, CREDENTIAL_BYTES, SHARE_COUNT, SHARE_THRESHOLD,
};

pub fn command_credential(matches: &clap::ArgMatches) {
    let bytes = match matches.value_of("bytes") {
        Some(bytes) => match bytes.parse::<usize>() {
            Ok(bytes) => bytes,
            Err(_) => {
                eprintln!("voteguard credential: --bytes must be an integer");
                std::process::exit(1);
            }
        },
        None => CREDENTIAL_BYTES,
    };

    let credential = generate_credential(bytes);
    let shares = match split_credential(&credential, SHARE_COUNT, SHARE_THRESHOLD) {
        Ok(shares) => shares,
        Err(e) => {
            eprintln!("voteguard credential: {}", e);
            std::process::exit(1);
        }
    };

    // The credential itself is never printed; only the two shares leave
    // this process, one per custodian.
    println!("voter-share: {}", shares[0].to_hex());
    println!("station-share: {}", shares[1].to_hex());
}
