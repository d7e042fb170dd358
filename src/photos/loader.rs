use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::executor::{block_on, ThreadPool};
use futures::future::{AbortHandle, Abortable};
use futures::StreamExt;

use super::fallback::fallback_card;
use super::listing::{list_or_empty, PhotoListing, PhotoRecord};
use super::{decode, LoadedPhoto, PhotoError, PhotoOrigin};

enum LoadEvent {
    Listed {
        listing: Arc<dyn PhotoListing>,
        records: Vec<PhotoRecord>,
    },
    Loaded(LoadedPhoto),
    Dropped {
        label: String,
        error: PhotoError,
    },
}

/// Sends `event` unless the loader has gone away
fn report(sender: &UnboundedSender<LoadEvent>, event: LoadEvent) -> Result<(), PhotoError> {
    if sender.is_closed() {
        return Err(PhotoError::Cancelled);
    }
    sender
        .unbounded_send(event)
        .map_err(|_| PhotoError::Cancelled)
}

/// Runs `job`, turning a panic into [`PhotoError::Panicked`]
fn catch_panic<T>(job: impl FnOnce() -> T) -> Result<T, PhotoError> {
    panic::catch_unwind(AssertUnwindSafe(job)).map_err(|payload| PhotoError::Panicked(panic_message(payload)))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .unwrap_or_else(|| "unknown cause".to_string()),
    }
}

fn fallback_photo(label: impl Into<String>) -> LoadedPhoto {
    LoadedPhoto {
        label: label.into(),
        origin: PhotoOrigin::Fallback,
        image: fallback_card(),
    }
}

/// Background photo loading
///
/// Every load is an independent abortable task on a small thread pool. Results
/// come back over a channel and are collected by [`poll_completed`], which
/// the frame loop calls once per frame.
///
/// [`poll_completed`]: PhotoLoader::poll_completed
pub struct PhotoLoader {
    pool: ThreadPool,
    sender: UnboundedSender<LoadEvent>,
    receiver: UnboundedReceiver<LoadEvent>,
    handles: Vec<AbortHandle>,
    pending: usize,
    min_photos: usize,
}

impl PhotoLoader {
    /// Creates a loader that pads remote listings to `min_photos` photos
    pub fn new(min_photos: usize) -> Result<Self, PhotoError> {
        let pool = ThreadPool::builder()
            .pool_size(2)
            .name_prefix("photo-loader-")
            .create()
            .map_err(PhotoError::Pool)?;
        let (sender, receiver) = mpsc::unbounded();

        Ok(Self {
            pool,
            sender,
            receiver,
            handles: Vec::new(),
            pending: 0,
            min_photos,
        })
    }

    /// Number of loads that have not reported back yet
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending == 0
    }

    /// Lists the remote service and loads every photo it offers
    pub fn load_remote(&mut self, listing: Arc<dyn PhotoListing>) {
        self.spawn("photo listing".to_string(), move || {
            let records = catch_panic(|| list_or_empty(listing.as_ref())).unwrap_or_else(|e| {
                log::warn!("Photo listing failed, using fallback cards: {e}");
                Vec::new()
            });
            LoadEvent::Listed { listing, records }
        });
    }

    /// Reads an image file fully into memory and decodes it
    pub fn load_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let label = upload_label(&path);
        self.spawn(label.clone(), move || {
            let result = std::fs::read(&path)
                .map_err(|source| PhotoError::Io {
                    path: path.clone(),
                    source,
                })
                .and_then(|bytes| decode(&bytes));

            match result {
                Ok(image) => LoadEvent::Loaded(LoadedPhoto {
                    label,
                    origin: PhotoOrigin::Upload(path),
                    image,
                }),
                Err(error) => LoadEvent::Dropped { label, error },
            }
        });
    }

    /// Decodes an in-memory image file
    pub fn load_bytes(&mut self, label: impl Into<String>, bytes: Vec<u8>) {
        let label = label.into();
        self.spawn(label.clone(), move || match decode(&bytes) {
            Ok(image) => LoadEvent::Loaded(LoadedPhoto {
                label: label.clone(),
                origin: PhotoOrigin::Upload(PathBuf::from(&label)),
                image,
            }),
            Err(error) => LoadEvent::Dropped { label, error },
        });
    }

    /// Queues `count` fallback cards
    pub fn load_fallbacks(&mut self, count: usize) {
        for index in 0..count {
            let label = format!("fallback-{index}");
            self.spawn(label.clone(), move || LoadEvent::Loaded(fallback_photo(label)));
        }
    }

    fn spawn<F>(&mut self, name: String, job: F)
    where
        F: FnOnce() -> LoadEvent + Send + 'static,
    {
        let sender = self.sender.clone();
        let (handle, registration) = AbortHandle::new_pair();

        let task = async move {
            if sender.is_closed() {
                log::debug!("Skipping {name}: {}", PhotoError::Cancelled);
                return;
            }
            let event = catch_panic(job).unwrap_or_else(|error| LoadEvent::Dropped {
                label: name.clone(),
                error,
            });
            if let Err(e) = report(&sender, event) {
                log::debug!("Discarding {name}: {e}");
            }
        };

        self.pool.spawn_ok(async move {
            let _ = Abortable::new(task, registration).await;
        });
        self.handles.push(handle);
        self.pending += 1;
    }

    /// Collects every photo finished since the last call without blocking
    pub fn poll_completed(&mut self) -> Vec<LoadedPhoto> {
        let mut completed = Vec::new();
        while let Ok(Some(event)) = self.receiver.try_next() {
            self.handle_event(event, &mut completed);
        }
        completed
    }

    /// Waits for every queued load, including ones spawned along the way
    pub fn finish_blocking(&mut self) -> Vec<LoadedPhoto> {
        let mut completed = Vec::new();
        while self.pending > 0 {
            match block_on(self.receiver.next()) {
                Some(event) => self.handle_event(event, &mut completed),
                None => break,
            }
        }
        completed
    }

    fn handle_event(&mut self, event: LoadEvent, completed: &mut Vec<LoadedPhoto>) {
        self.pending = self.pending.saturating_sub(1);

        match event {
            LoadEvent::Listed { listing, records } => {
                let padding = self.min_photos.saturating_sub(records.len());
                for record in records {
                    let listing = listing.clone();
                    self.spawn(record.key.clone(), move || load_record(listing.as_ref(), record));
                }
                if padding > 0 {
                    log::info!("Padding photo set with {padding} fallback cards");
                    self.load_fallbacks(padding);
                }
            }
            LoadEvent::Loaded(photo) => {
                log::debug!("Loaded photo {} ({}x{})", photo.label, photo.image.width(), photo.image.height());
                completed.push(photo);
            }
            LoadEvent::Dropped { label, error } => {
                log::warn!("Dropping photo {label}: {error}");
            }
        }

        if self.pending == 0 {
            self.handles.clear();
        }
    }

    /// Abandons every in-flight load
    pub fn shutdown(&mut self) {
        let abandoned = self.pending;
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        self.receiver.close();
        while let Ok(Some(_)) = self.receiver.try_next() {}
        self.pending = 0;
        log::info!("Photo loader shut down ({abandoned} loads abandoned)");
    }
}

impl Drop for PhotoLoader {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

fn upload_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Downloads one listed photo, substituting a fallback card on failure
fn load_record(listing: &dyn PhotoListing, record: PhotoRecord) -> LoadEvent {
    let result = catch_panic(|| listing.fetch(&record))
        .and_then(|fetched| fetched)
        .and_then(|bytes| decode(&bytes));

    match result {
        Ok(image) => LoadEvent::Loaded(LoadedPhoto {
            label: record.key,
            origin: PhotoOrigin::Remote {
                id: record.id,
                url: record.url,
            },
            image,
        }),
        Err(e) => {
            log::warn!("Failed to load photo {}: {e}", record.url);
            log::info!("Substituting fallback card for {}", record.key);
            LoadEvent::Loaded(fallback_photo(record.key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photos::EmptyListing;
    use image::RgbaImage;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    struct StubListing {
        records: Vec<PhotoRecord>,
    }

    impl PhotoListing for StubListing {
        fn list(&self) -> Result<Vec<PhotoRecord>, PhotoError> {
            Ok(self.records.clone())
        }

        fn fetch(&self, record: &PhotoRecord) -> Result<Vec<u8>, PhotoError> {
            if record.url.ends_with("broken.jpg") {
                Err(PhotoError::Listing("HTTP 404".into()))
            } else {
                Ok(png_bytes(40, 30))
            }
        }
    }

    fn record(id: &str, url: &str) -> PhotoRecord {
        PhotoRecord {
            id: id.to_string(),
            key: format!("christmas-tree/{id}"),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_empty_listing_is_padded_with_fallbacks() {
        let mut loader = PhotoLoader::new(5).unwrap();
        loader.load_remote(Arc::new(EmptyListing));

        let photos = loader.finish_blocking();
        assert_eq!(photos.len(), 5);
        assert!(photos.iter().all(|p| p.origin == PhotoOrigin::Fallback));
        assert!(photos.iter().all(|p| p.image.dimensions() == (512, 512)));
        assert!(loader.is_idle());
    }

    #[test]
    fn test_failed_remote_photo_is_replaced() {
        let mut loader = PhotoLoader::new(5).unwrap();
        loader.load_remote(Arc::new(StubListing {
            records: vec![
                record("a", "https://cdn.example.com/a.png"),
                record("b", "https://cdn.example.com/broken.jpg"),
            ],
        }));

        let photos = loader.finish_blocking();
        assert_eq!(photos.len(), 5);
        let remote: Vec<_> = photos
            .iter()
            .filter(|p| matches!(p.origin, PhotoOrigin::Remote { .. }))
            .collect();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].image.dimensions(), (40, 30));
    }

    #[test]
    fn test_failed_uploads_are_dropped() {
        let mut loader = PhotoLoader::new(5).unwrap();
        loader.load_bytes("garbage.jpg", b"not an image".to_vec());
        loader.load_file("/definitely/missing/photo.png");
        loader.load_bytes("good.png", png_bytes(8, 8));

        let photos = loader.finish_blocking();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].label, "good.png");
    }

    #[test]
    fn test_shutdown_discards_results() {
        let mut loader = PhotoLoader::new(5).unwrap();
        loader.load_fallbacks(3);
        loader.shutdown();

        assert!(loader.is_idle());
        assert!(loader.poll_completed().is_empty());
        assert!(loader.finish_blocking().is_empty());
    }

    struct PanickingListing {
        records: Vec<PhotoRecord>,
        panic_on_list: bool,
    }

    impl PhotoListing for PanickingListing {
        fn list(&self) -> Result<Vec<PhotoRecord>, PhotoError> {
            if self.panic_on_list {
                panic!("listing service exploded");
            }
            Ok(self.records.clone())
        }

        fn fetch(&self, record: &PhotoRecord) -> Result<Vec<u8>, PhotoError> {
            panic!("fetch of {} exploded", record.url);
        }
    }

    #[test]
    fn test_panicking_fetch_gets_fallback_cards() {
        let mut loader = PhotoLoader::new(3).unwrap();
        loader.load_remote(Arc::new(PanickingListing {
            records: (0..6)
                .map(|i| record(&i.to_string(), &format!("https://cdn.example.com/{i}.png")))
                .collect(),
            panic_on_list: false,
        }));
        loader.load_fallbacks(1);

        let photos = loader.finish_blocking();
        assert_eq!(photos.len(), 7);
        assert!(photos.iter().all(|p| p.origin == PhotoOrigin::Fallback));
        assert!(photos.iter().any(|p| p.label == "christmas-tree/5"));
        assert!(loader.is_idle());

        // The pool still runs work afterwards
        loader.load_bytes("after.png", png_bytes(4, 4));
        let photos = loader.finish_blocking();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].label, "after.png");
    }

    #[test]
    fn test_panicking_listing_is_padded() {
        let mut loader = PhotoLoader::new(4).unwrap();
        loader.load_remote(Arc::new(PanickingListing {
            records: Vec::new(),
            panic_on_list: true,
        }));

        let photos = loader.finish_blocking();
        assert_eq!(photos.len(), 4);
        assert!(photos.iter().all(|p| p.origin == PhotoOrigin::Fallback));
    }

    #[test]
    fn test_panicking_job_is_dropped() {
        let mut loader = PhotoLoader::new(0).unwrap();
        for _ in 0..3 {
            loader.spawn("doomed".to_string(), || -> LoadEvent { panic!("decoder blew up") });
        }
        loader.load_fallbacks(2);

        let photos = loader.finish_blocking();
        assert_eq!(photos.len(), 2);
        assert!(loader.is_idle());
    }

    #[test]
    fn test_panic_message_is_kept() {
        let error = catch_panic(|| -> u32 { panic!("boom {}", 7) }).unwrap_err();
        assert!(matches!(&error, PhotoError::Panicked(message) if message == "boom 7"));
        let error = catch_panic(|| -> u32 { panic!("static boom") }).unwrap_err();
        assert_eq!(error.to_string(), "photo load panicked: static boom");
    }

    #[test]
    fn test_upload_label_uses_file_name() {
        assert_eq!(upload_label(Path::new("/home/me/Pictures/tree.jpg")), "tree.jpg");
    }
}
