pub mod download;
pub mod error;
pub mod export;
pub mod input;
pub mod model;
pub mod output;
pub mod vk_client;

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use crate::error::{Error, Result};
use crate::export::PhotosExport;
use crate::input::AlbumQuery;
use crate::output::Sink;
use crate::vk_client::{ChallengeResolver, VkClient};

/// VK Album Downloader: bulk download photo albums from vk.com.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Where the file with user data is
    #[clap(short, long = "user_data", default_value = "data.txt")]
    pub user_data: PathBuf,

    /// Path to text file with albums links
    #[clap(short, long = "albums_list", default_value = "albums_list.txt")]
    pub albums_list: PathBuf,

    /// Where to put downloaded albums
    #[clap(short, long = "output_folder", default_value = "vk_downloaded_albums")]
    pub output_folder: PathBuf,

    /// Export albums' metadata (photos, comments, etc.) to CSV files
    #[clap(short = 'm', long = "export_metadata")]
    pub export_metadata: bool,

    /// Output a script run to .log file instead
    #[clap(short, long)]
    pub log: bool,
}

/// Remote service endpoints, overridable so tests can point the whole run at
/// a mock server.
pub struct Endpoints {
    pub api: String,
    pub oauth: String,
}

impl Default for Endpoints {
    fn default() -> Endpoints {
        Endpoints {
            api: vk_client::API_BASE.to_string(),
            oauth: vk_client::OAUTH_BASE.to_string(),
        }
    }
}

/// One full run: load inputs, authenticate, then download each album in input
/// order.
///
/// An API error while fetching an album's metadata or photo listing stops the
/// remaining albums but returns `Ok`, so the process still exits 0; startup
/// and authentication failures bubble up as `Err` for the exit-code mapping
/// in `main`.
pub async fn run(
    args: &Args,
    endpoints: &Endpoints,
    challenges: &dyn ChallengeResolver,
    sink: &mut Sink,
) -> Result<()> {
    let credentials = input::read_credentials(&args.user_data)?;
    let queries = input::read_queries(&args.albums_list, sink)?;

    let mut client = VkClient::new(&endpoints.api, &endpoints.oauth);
    if let Err(e) = client.auth(credentials, challenges).await {
        return Err(match e {
            auth @ Error::Auth { .. } => auth,
            other => Error::Auth {
                detail: other.to_string(),
            },
        });
    }

    sink.line(&format!("number of albums to download: {}", queries.len()))?;
    for query in &queries {
        match process_album(&client, query, args, sink).await {
            Ok(()) => {}
            Err(api @ Error::Api { .. }) => {
                sink.line("exception:")?;
                sink.line(&api.to_string())?;
                return Ok(());
            }
            Err(other) => return Err(other),
        }
    }
    Ok(())
}

async fn process_album(
    client: &VkClient,
    query: &AlbumQuery,
    args: &Args,
    sink: &mut Sink,
) -> Result<()> {
    let album = client.get_album(query).await?;
    let images_num = model::album_size(&album);
    let photos = client.fetch_photos(query, images_num).await?;

    let album_path = args
        .output_folder
        .join(model::album_dir_name(query, model::album_title(&album)));
    fs::create_dir_all(&album_path)?;

    let mut photos_csv = None;
    if args.export_metadata {
        export::export_album(&album_path, &album)?;
        let comments = client.fetch_all_comments(query).await?;
        export::export_comments(&album_path, &comments)?;
        photos_csv = Some(PhotosExport::new(&album_path));
    }

    sink.line(&format!("downloading album: {}", query.album_id))?;
    let mut count = 0u64;
    for photo in &photos {
        if let (Some(id), Some(url)) = (model::photo_id(photo), model::best_size_url(photo)) {
            let dest = album_path.join(format!("{id}{}", model::file_extension(url)));
            download::download_image(client.http(), url, &dest, sink).await?;
        }
        count += 1;
        sink.progress(count, images_num)?;

        if let Some(export) = photos_csv.as_mut() {
            export.append(photo)?;
        }
    }
    if let Some(export) = photos_csv {
        export.finish()?;
    }
    sink.newline()?;
    Ok(())
}
