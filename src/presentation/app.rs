//! Command runner.

use std::io::Write;
use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use tracing::{debug, info, warn};

use crate::application::services::AlbumService;
use crate::domain::entities::{AlbumState, Coordinate, MapRegion, PhotoId, PhotoRecord, Pin, PinId};
use crate::domain::ports::{PhotoCachePort, PinStorePort};
use crate::infrastructure::cache::DiskPhotoCache;
use crate::infrastructure::config::{
    AlbumCommand, AppConfig, Command, PhotoCommand, PinCommand, RegionCommand, StorageManager,
};
use crate::infrastructure::flickr::FlickrPhotoSource;
use crate::infrastructure::persistence::SqlitePinStore;
use crate::presentation::events::spawn_event_logger;
use crate::presentation::output::{album_summary, photo_line, pin_line, region_line};

/// Runs CLI commands against the pin store and album service.
pub struct App {
    store: Arc<dyn PinStorePort>,
    albums: AlbumService,
    cache: Arc<DiskPhotoCache>,
    storage: StorageManager,
}

impl App {
    #[must_use]
    pub fn new(
        store: Arc<dyn PinStorePort>,
        albums: AlbumService,
        cache: Arc<DiskPhotoCache>,
        storage: StorageManager,
    ) -> Self {
        Self {
            store,
            albums,
            cache,
            storage,
        }
    }

    /// Wires the production adapters described by `config`.
    ///
    /// # Errors
    /// Returns error if the cache directory, database or HTTP client
    /// cannot be set up.
    pub async fn from_config(config: &AppConfig, storage: StorageManager) -> Result<Self> {
        let cache_dir = config.effective_cache_dir();
        let cache = Arc::new(
            DiskPhotoCache::new(cache_dir.clone())
                .await
                .wrap_err_with(|| format!("failed to open photo cache at {}", cache_dir.display()))?,
        );

        let db_path = config
            .effective_database_path()
            .ok_or_else(|| eyre!("could not determine a data directory; pass --data-dir"))?;
        let store: Arc<dyn PinStorePort> = Arc::new(
            SqlitePinStore::open(&db_path, cache.clone())
                .wrap_err_with(|| format!("failed to open pin store at {}", db_path.display()))?,
        );

        if !config.flickr.has_api_key() {
            warn!("No Flickr API key configured; photo searches will fail");
        }
        let source = Arc::new(FlickrPhotoSource::new(config.flickr.clone())?);

        let albums = AlbumService::new(store.clone(), source, cache.clone())
            .with_max_concurrent_downloads(config.album.max_concurrent_downloads);

        spawn_event_logger(store.subscribe(), albums.subscribe());

        info!(
            database = %db_path.display(),
            cache = %cache.dir().display(),
            cached_photos = cache.len(),
            "Adapters ready"
        );

        Ok(Self::new(store, albums, cache, storage))
    }

    /// Executes one command, writing its report to `out`.
    ///
    /// # Errors
    /// Returns error if the command fails or output cannot be written.
    pub async fn run<W: Write>(&self, command: Command, out: &mut W) -> Result<()> {
        debug!(?command, "Running command");
        match command {
            Command::Pin(cmd) => self.run_pin(cmd, out).await,
            Command::Album(cmd) => self.run_album(cmd, out).await,
            Command::Photo(cmd) => self.run_photo(cmd, out).await,
            Command::Region(cmd) => self.run_region(cmd, out),
        }
    }

    async fn run_pin<W: Write>(&self, command: PinCommand, out: &mut W) -> Result<()> {
        match command {
            PinCommand::Add {
                latitude,
                longitude,
            } => {
                let pin = self.store.create_pin(Coordinate::new(latitude, longitude)?).await?;
                self.remember_pin(Some(pin.id()));
                writeln!(out, "{}", pin_line(&pin))?;
            }
            PinCommand::List => {
                let pins = self.store.list_pins().await?;
                if pins.is_empty() {
                    writeln!(out, "No pins yet")?;
                }
                for pin in &pins {
                    writeln!(out, "{}", pin_line(pin))?;
                }
            }
            PinCommand::Delete { pin } => {
                let pin = self.pin(pin).await?;
                self.albums.delete_pin(&pin).await?;
                self.forget_pin(pin.id());
                writeln!(out, "Deleted pin {}", pin.id())?;
            }
            PinCommand::Find {
                latitude,
                longitude,
            } => {
                let coordinate = Coordinate::new(latitude, longitude)?;
                match self.store.find_pin_at(coordinate).await? {
                    Some(pin) => writeln!(out, "{}", pin_line(&pin))?,
                    None => writeln!(out, "No pin at {coordinate}")?,
                }
            }
        }
        Ok(())
    }

    async fn run_album<W: Write>(&self, command: AlbumCommand, out: &mut W) -> Result<()> {
        let (pin, state) = match command {
            AlbumCommand::Show { pin } => {
                let pin = self.pin(pin).await?;
                let state = self.albums.load_album(&pin).await?;
                (pin, state)
            }
            AlbumCommand::Refresh { pin } => {
                let pin = self.pin(pin).await?;
                let state = self.albums.refresh_album(&pin).await?;
                (pin, state)
            }
        };

        self.remember_pin(Some(pin.id()));
        self.print_album(&pin, &state, out).await
    }

    async fn run_photo<W: Write>(&self, command: PhotoCommand, out: &mut W) -> Result<()> {
        match command {
            PhotoCommand::Delete { pin, photo } => {
                let pin = self.pin(pin).await?;
                let record = self.photo(&pin, photo).await?;
                self.albums.delete_photo(&pin, &record).await?;
                writeln!(out, "Deleted photo {}", record.id)?;
            }
            PhotoCommand::Path { pin, photo } => {
                let pin = self.pin(pin).await?;
                let record = self.photo(&pin, photo).await?;
                if !self.cache.contains(&record.cache_key).await {
                    bail!("photo {} has no cached file", record.id);
                }
                writeln!(out, "{}", self.cache.path_for(&record.cache_key).display())?;
            }
        }
        Ok(())
    }

    fn run_region<W: Write>(&self, command: RegionCommand, out: &mut W) -> Result<()> {
        match command {
            RegionCommand::Show => match self.storage.load_state()?.last_region {
                Some(region) => writeln!(out, "{}", region_line(&region))?,
                None => writeln!(out, "No region saved")?,
            },
            RegionCommand::Set {
                latitude,
                longitude,
                latitude_delta,
                longitude_delta,
            } => {
                let region = MapRegion::new(
                    Coordinate::new(latitude, longitude)?,
                    latitude_delta,
                    longitude_delta,
                )?;
                self.storage
                    .update_state(|state| state.last_region = Some(region))
                    .wrap_err("failed to save map region")?;
                writeln!(out, "{}", region_line(&region))?;
            }
        }
        Ok(())
    }

    async fn print_album<W: Write>(&self, pin: &Pin, state: &AlbumState, out: &mut W) -> Result<()> {
        writeln!(
            out,
            "Album for pin {} at {}: {}",
            pin.id(),
            pin.coordinate(),
            album_summary(state)
        )?;
        for record in state.photos() {
            let cached = self.cache.contains(&record.cache_key).await;
            writeln!(out, "  {}", photo_line(record, cached))?;
        }
        Ok(())
    }

    async fn pin(&self, id: PinId) -> Result<Pin> {
        self.store
            .find_pin(id)
            .await?
            .ok_or_else(|| eyre!("no pin with id {id}"))
    }

    async fn photo(&self, pin: &Pin, id: PhotoId) -> Result<PhotoRecord> {
        self.store
            .photos_for(pin)
            .await?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| eyre!("pin {} has no photo {id}", pin.id()))
    }

    fn remember_pin(&self, pin_id: Option<PinId>) {
        if let Err(e) = self.storage.update_state(|state| state.last_pin_id = pin_id) {
            warn!(error = %e, "Failed to save session state");
        }
    }

    fn forget_pin(&self, pin_id: PinId) {
        match self.storage.load_state() {
            Ok(state) if state.last_pin_id == Some(pin_id) => self.remember_pin(None),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to read session state"),
        }
    }
}
