//! Change event logging.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::entities::AlbumEvent;
use crate::domain::ports::StoreEvent;

/// Describes a store change for the log.
#[must_use]
pub fn describe_store_event(event: &StoreEvent) -> String {
    match event {
        StoreEvent::PinCreated(pin) => format!("pin {} created at {}", pin.id(), pin.coordinate()),
        StoreEvent::PinDeleted(pin_id) => format!("pin {pin_id} deleted"),
        StoreEvent::PhotosSaved { pin_id, count } => format!("{count} photos saved for pin {pin_id}"),
        StoreEvent::PhotoDeleted { pin_id, photo_id } => {
            format!("photo {photo_id} removed from pin {pin_id}")
        }
        StoreEvent::PhotosCleared { pin_id, count } => {
            format!("{count} photos cleared from pin {pin_id}")
        }
    }
}

/// Logs store and album events until both channels close.
pub fn spawn_event_logger(
    mut store_events: broadcast::Receiver<StoreEvent>,
    mut album_events: broadcast::Receiver<AlbumEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut store_open = true;
        let mut album_open = true;

        while store_open || album_open {
            tokio::select! {
                result = store_events.recv(), if store_open => match result {
                    Ok(event) => debug!(target: "virtual_tourist::events", "{}", describe_store_event(&event)),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Store event logger lagged"),
                    Err(RecvError::Closed) => store_open = false,
                },
                result = album_events.recv(), if album_open => match result {
                    Ok(event) => debug!(target: "virtual_tourist::events", pin_id = %event.pin_id, state = %event.state, "Album state"),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Album event logger lagged"),
                    Err(RecvError::Closed) => album_open = false,
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AlbumState, Coordinate, Pin, PinId};

    #[test]
    fn test_describe_store_event() {
        let pin = Pin::new(Coordinate::new(1.0, 2.0).unwrap());
        let text = describe_store_event(&StoreEvent::PinCreated(pin.clone()));
        assert!(text.contains(&pin.id().to_string()));

        let text = describe_store_event(&StoreEvent::PhotosSaved {
            pin_id: pin.id(),
            count: 3,
        });
        assert!(text.starts_with("3 photos saved"));
    }

    #[tokio::test]
    async fn test_logger_stops_when_channels_close() {
        let (store_tx, store_rx) = broadcast::channel(4);
        let (album_tx, album_rx) = broadcast::channel(4);
        let handle = spawn_event_logger(store_rx, album_rx);

        store_tx.send(StoreEvent::PinDeleted(PinId::generate())).unwrap();
        album_tx
            .send(AlbumEvent {
                pin_id: PinId::generate(),
                state: AlbumState::Empty,
            })
            .unwrap();
        drop(store_tx);
        drop(album_tx);

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
