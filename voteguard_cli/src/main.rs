use clap::{App, Arg, SubCommand};

mod command_credential;
mod command_keygen;

fn main() {
    env_logger::init();

    let matches = App::new("Voteguard CLI")
        .version("0.1")
        .about("Key and credential tooling for the voteguard voting core")
        .subcommand(
            SubCommand::with_name("keygen")
                .about("Generate a homomorphic keypair for the tallying authority")
                .arg(
                    Arg::with_name("bits")
                        .long("bits")
                        .takes_value(true)
                        .help("Modulus strength in bits (default 2048)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("credential")
                .about("Generate a voter credential and split it into two shares")
                .arg(
                    Arg::with_name("bytes")
                        .long("bytes")
                        .takes_value(true)
                        .help("Credential length in bytes (default 128)"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("keygen") {
        command_keygen::command_keygen(matches);
    } else if let Some(matches) = matches.subcommand_matches("credential") {
        command_credential::command_credential(matches);
    } else {
        eprintln!("voteguard: no subcommand given, try --help");
        std::process::exit(1);
    }
}
