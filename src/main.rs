use clap::Parser;

use proposal_pdf::{SupabaseStorage, SupabaseStore};

/// Generate the commercial PDF for a proposal and publish it to storage.
#[derive(Parser)]
#[command(name = "proposal-pdf", version, about)]
struct Args {
    /// Proposal id to render.
    proposal_id: i64,

    /// Optional customer logo (PNG or JPEG) to place in the page header.
    #[arg(long)]
    logo_url: Option<String>,

    /// Storage bucket for the generated document.
    #[arg(long, default_value = "proposals")]
    bucket: String,

    /// Base URL of the Supabase project.
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: String,

    /// Service-role key used for both the REST and storage APIs.
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    service_key: String,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let store = SupabaseStore::new(&args.supabase_url, &args.service_key);
    let blobs = SupabaseStorage::with_bucket(&args.supabase_url, &args.service_key, &args.bucket);

    match proposal_pdf::generate(&store, &blobs, args.proposal_id, args.logo_url.as_deref()).await
    {
        Ok(publication) => {
            println!(
                "{}",
                serde_json::json!({
                    "path": publication.path,
                    "signed_url": publication.signed_url,
                })
            );
        }
        Err(e) => {
            eprintln!("error ({}): {e}", e.kind().as_str());
            std::process::exit(1);
        }
    }
}
