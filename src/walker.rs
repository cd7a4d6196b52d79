//! Asynchronous listing: one cooperative walker task per list call, feeding
//! entries through a bounded channel into an [`EntryStream`].

use std::{
    collections::HashSet,
    future::Future,
    path::PathBuf,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::Stream;
use tokio::sync::mpsc;
use tracing::trace;

use crate::{
    error::WalkError,
    fs::{self, Entry, EntryKind},
    list_tree::{self, ListTree, Node, WalkOpts},
    style::PathStyle,
};

/// Why a walk stopped early.
enum Stop {
    /// The consumer dropped the stream; abandon everything quietly.
    Cancelled,
    Failed(WalkError),
}

impl From<WalkError> for Stop {
    fn from(err: WalkError) -> Self {
        Stop::Failed(err)
    }
}

type EntrySender = mpsc::Sender<Result<Entry, WalkError>>;

/// Stream of entries produced by [`Glob::list`](crate::Glob::list).
///
/// Entries arrive as soon as the underlying enumerations produce them, in no
/// particular order. Dropping the stream cancels the walk; the walker task
/// unwinds at its next send.
pub struct EntryStream {
    rx: mpsc::Receiver<Result<Entry, WalkError>>,
    seen: Option<HashSet<String>>,
    style: PathStyle,
}

impl Stream for EntryStream {
    type Item = Result<Entry, WalkError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let style = this.style;
        loop {
            let item = match this.rx.poll_recv(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Ready(Some(item)) => item,
            };
            if let (Some(seen), Ok(entry)) = (&mut this.seen, &item) {
                if !seen.insert(style.absolute(&entry.path.to_string_lossy())) {
                    continue;
                }
            }
            return Poll::Ready(Some(item));
        }
    }
}

/// Starts the walker task for `tree` and returns the consuming stream.
///
/// Must be called from within a tokio runtime.
pub(crate) fn spawn_list(
    tree: Arc<ListTree>,
    root: PathBuf,
    style: PathStyle,
    opts: WalkOpts,
) -> EntryStream {
    let (tx, rx) = mpsc::channel(64);
    let seen = tree.can_overlap.then(HashSet::new);

    // the task is not joined: it ends on its own once every root is walked,
    // or as soon as a send fails because the stream was dropped
    let _ = tokio::spawn(async move {
        for (key, node) in &tree.roots {
            let dir = list_tree::root_dir(key, &root);
            match walk_node(node, dir, opts, &tx).await {
                Ok(()) => {}
                Err(Stop::Cancelled) => return,
                Err(Stop::Failed(err)) => {
                    // the receiver may already be gone; nothing to do then
                    let _ = tx.send(Err(err)).await;
                    return;
                }
            }
        }
    });

    EntryStream { rx, seen, style }
}

fn walk_node<'a>(
    node: &'a Node,
    dir: PathBuf,
    opts: WalkOpts,
    tx: &'a EntrySender,
) -> Pin<Box<dyn Future<Output = Result<(), Stop>> + Send + 'a>> {
    Box::pin(async move {
        trace!(dir = %dir.display(), "listing directory");

        let Some(children) = &node.children else {
            return walk_recursive(node, dir, opts, tx).await;
        };

        if node.intermediate && opts.case_sensitive {
            for child in children {
                let Some(name) = child.literal.as_deref() else {
                    unreachable!("intermediate nodes only have literal children");
                };
                walk_node(&child.node, fs::join_dir(&dir, name), opts, tx).await?;
            }
            return Ok(());
        }

        let entries = fs::list_dir_async(&dir, opts.follow_links).await?;

        if !opts.case_sensitive {
            for child in children {
                if !child.node.intermediate {
                    continue;
                }
                let Some(literal) = child.literal.as_deref() else {
                    continue;
                };
                let present = entries.iter().any(|entry| {
                    entry.path.file_name().is_some_and(|name| {
                        child.matches(&name.to_string_lossy(), opts.case_sensitive)
                    })
                });
                if !present {
                    fs::list_dir_async(&fs::join_dir(&dir, literal), opts.follow_links).await?;
                }
            }
        }

        for entry in entries {
            let Some(name) = entry.path.file_name() else {
                continue;
            };
            let name = name.to_string_lossy().into_owned();

            if entry.kind == EntryKind::Directory {
                for child in children {
                    if child.matches(&name, opts.case_sensitive) {
                        match walk_node(&child.node, fs::join_dir(&dir, &name), opts, tx).await {
                            // missing entries below a wildcard descent stay
                            // silent, same as the sync walker
                            Err(Stop::Failed(err)) if err.is_not_found() => {}
                            result => result?,
                        }
                    }
                }
            }

            if node.validates(&name) {
                send(tx, entry).await?;
            }
        }
        Ok(())
    })
}

/// Depth-first subtree walk for a recursive node. Followed links that point
/// back at an ancestor directory are skipped instead of looping.
async fn walk_recursive(
    node: &Node,
    base: PathBuf,
    opts: WalkOpts,
    tx: &EntrySender,
) -> Result<(), Stop> {
    let mut pending = vec![base.clone()];
    while let Some(dir) = pending.pop() {
        let real_dir = if opts.follow_links {
            std::fs::canonicalize(&dir).ok()
        } else {
            None
        };
        for entry in fs::list_dir_async(&dir, opts.follow_links).await? {
            if entry.kind == EntryKind::Directory {
                let descend = if opts.follow_links {
                    match (std::fs::canonicalize(&entry.path), &real_dir) {
                        (Ok(real_entry), Some(real_dir)) => !real_dir.starts_with(&real_entry),
                        _ => false,
                    }
                } else {
                    true
                };
                if descend {
                    pending.push(entry.path.clone());
                }
            }
            if node.validates(&list_tree::relative_posix(&entry.path, &base)) {
                send(tx, entry).await?;
            }
        }
    }
    Ok(())
}

async fn send(tx: &EntrySender, entry: Entry) -> Result<(), Stop> {
    tx.send(Ok(entry)).await.map_err(|_| Stop::Cancelled)
}
