mod ids;
mod playlist;
mod song;

pub use ids::{PlaylistId, SongId};
pub use playlist::Playlist;
pub use song::{Song, SongMetadata};
