use futures::StreamExt;
use pathglob::{Glob, GlobOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let glob = Glob::new_with_opts(
        "**/*.toml",
        GlobOptions {
            case_sensitive: Some(false),
            ..GlobOptions::default()
        },
    )
    .unwrap();

    let mut entries = glob.list().unwrap();

    while let Some(entry) = entries.next().await {
        match entry {
            Ok(entry) => println!("{:?}: {}", entry.kind, entry.path.display()),
            Err(err) => eprintln!("ERR: {err}"),
        }
    }
}
