use std::collections::BTreeMap;
use std::fs::remove_file;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded};
use log::{debug, info, warn};

use loctars_loci::Superlocus;
use loctars_scoring::PickConfig;

use crate::analyse::analyse_locus;
use crate::consts::QUEUE_SLOTS_PER_WORKER;
use crate::sink::{OutputRequest, PartialSink, partial_path};

/// Items on the work queue.
pub enum WorkItem {
    Locus { counter: usize, slocus: Superlocus },
    /// Shutdown sentinel; every worker puts it back before leaving.
    Exit,
}

/// Partial files of every worker, grouped by stream name.
pub type PartialFiles = BTreeMap<&'static str, Vec<PathBuf>>;

fn worker(
    identifier: usize,
    receiver: Receiver<WorkItem>,
    sender: Sender<WorkItem>,
    directory: &Path,
    request: OutputRequest,
    config: &PickConfig,
) -> Result<BTreeMap<&'static str, PathBuf>> {
    let mut sink = PartialSink::create(directory, identifier, request)?;
    let mut processed = 0usize;

    while let Ok(item) = receiver.recv() {
        match item {
            WorkItem::Locus { counter, slocus } => {
                let superloci = analyse_locus(slocus, config);
                sink.write(counter, &superloci, config)?;
                processed += 1;
            }
            WorkItem::Exit => {
                // other workers may still be waiting for it; the queue stays
                // open while this worker holds its receiver
                sender
                    .send(WorkItem::Exit)
                    .map_err(|_| anyhow!("Work queue closed under worker {}", identifier))?;
                break;
            }
        }
    }

    debug!("Worker {} processed {} superloci", identifier, processed);
    sink.finish()
}

///
/// Delete whatever partial files the workers left behind.
///
fn remove_partials(directory: &Path, request: OutputRequest, threads: usize) {
    for identifier in 0..threads {
        for name in request.streams() {
            let path = partial_path(directory, name, identifier);
            match remove_file(&path) {
                Ok(()) => debug!("Removed {:?}", path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {:?}: {}", path, e),
            }
        }
    }
}

///
/// Feed the superloci to a fixed pool of workers.
///
/// Each superlocus gets a sequence number in input order; workers pick them
/// up as they become free and write counter-tagged records to their own
/// partial files. The call returns once every worker has closed its files.
/// On failure the partial files are removed before the error is returned.
///
/// # Arguments
///
/// - superloci: the input regions, in genomic order
/// - config: the picking configuration; `run_options.threads` sets the pool size
/// - directory: where the partial files are created
/// - request: optional streams to write
/// - on_enqueue: called with the number of superloci queued so far
///
pub fn run_pool<I, F>(
    superloci: I,
    config: &PickConfig,
    directory: &Path,
    request: OutputRequest,
    on_enqueue: F,
) -> Result<PartialFiles>
where
    I: Iterator<Item = Result<Superlocus>>,
    F: Fn(usize),
{
    let threads = config.run_options.threads.max(1);
    let (sender, receiver) = bounded::<WorkItem>(threads * QUEUE_SLOTS_PER_WORKER);
    info!("Starting {} workers", threads);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|identifier| {
                let receiver = receiver.clone();
                let sender = sender.clone();
                scope.spawn(move || worker(identifier, receiver, sender, directory, request, config))
            })
            .collect();
        drop(receiver);

        let mut queued = 0usize;
        let feed = || -> Result<()> {
            for slocus in superloci {
                queued += 1;
                sender
                    .send(WorkItem::Locus {
                        counter: queued,
                        slocus: slocus?,
                    })
                    .map_err(|_| anyhow!("All workers exited before superlocus {}", queued))?;
                on_enqueue(queued);
            }
            Ok(())
        };
        let fed = feed();
        // wake the workers even when feeding failed, so that the scope can end
        if sender.send(WorkItem::Exit).is_err() {
            debug!("Every worker exited before the end of the queue");
        }
        drop(sender);

        let mut partials = PartialFiles::new();
        let mut failure = fed.err();
        for handle in handles {
            let outcome = handle
                .join()
                .map_err(|_| anyhow!("A worker panicked"))
                .and_then(|result| result);
            match outcome {
                Ok(paths) => {
                    for (name, path) in paths {
                        partials.entry(name).or_default().push(path);
                    }
                }
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => {
                remove_partials(directory, request, threads);
                Err(e)
            }
            None => {
                info!("Queued {} superloci", queued);
                Ok(partials)
            }
        }
    })
}
