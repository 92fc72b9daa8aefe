use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use vk_album_downloader::error::Error;
use vk_album_downloader::output::Sink;
use vk_album_downloader::vk_client::StdinChallenges;
use vk_album_downloader::{Args, Endpoints, run};

const LOG_FILE: &str = "vk_album_downloader.log";

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut sink = if args.log {
        match Sink::log_file(Path::new(LOG_FILE)) {
            Ok(sink) => sink,
            Err(e) => {
                eprintln!("cannot open {LOG_FILE}: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        Sink::console()
    };

    let code = match run(&args, &Endpoints::default(), &StdinChallenges, &mut sink).await {
        Ok(()) => 0,
        Err(e) => {
            report(&e, &mut sink);
            e.exit_code()
        }
    };
    let _ = sink.finish();
    ExitCode::from(code.clamp(0, 255) as u8)
}

/// Prints the failure with the guidance line the operator needs.
fn report(err: &Error, sink: &mut Sink) {
    let _ = match err {
        Error::InputFile { guidance, .. } => {
            let _ = sink.line(&err.to_string());
            sink.line(guidance)
        }
        Error::ShortCredentials => {
            let _ = sink.line(&err.to_string());
            sink.line("please, check your user data in the file")
        }
        Error::Auth { detail } => {
            let _ = sink.line("could not authenticate to vk.com");
            let _ = sink.line(detail);
            sink.line("please, check your user data in the file")
        }
        other => sink.line(&other.to_string()),
    };
}
