use anyhow::{anyhow, Result};
use async_trait::async_trait;
use oxide_music_bot::bot::views::{download_payload, SelectableEntry};
use oxide_music_bot::bot::{AudioUpload, ChatTransport, MusicController, Outcome, StatusMessage};
use oxide_music_bot::media::ytdlp::parse_search_output;
use oxide_music_bot::media::{AudioFetcher, FetchError, Track, TrackSearcher};
use oxide_music_bot::session::SessionCache;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Status(String),
    Edit(String),
    Choices(Vec<SelectableEntry>),
    Delete,
    Audio { file_name: String, size: usize },
}

#[derive(Default)]
struct FakeChat {
    events: Mutex<Vec<Event>>,
}

impl FakeChat {
    fn record(&self, event: Event) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(event);
        Ok(())
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatTransport for FakeChat {
    async fn send_status(&self, chat_id: i64, text: &str) -> Result<StatusMessage> {
        self.record(Event::Status(text.to_string()))?;
        Ok(StatusMessage {
            chat_id,
            message_id: 7,
        })
    }

    async fn edit_status(&self, _status: StatusMessage, text: &str) -> Result<()> {
        self.record(Event::Edit(text.to_string()))
    }

    async fn show_choices(
        &self,
        _status: StatusMessage,
        _text: &str,
        entries: &[SelectableEntry],
    ) -> Result<()> {
        self.record(Event::Choices(entries.to_vec()))
    }

    async fn delete_status(&self, _status: StatusMessage) -> Result<()> {
        self.record(Event::Delete)
    }

    async fn send_audio(&self, _chat_id: i64, audio: AudioUpload) -> Result<()> {
        self.record(Event::Audio {
            file_name: audio.file_name,
            size: audio.bytes.len(),
        })
    }
}

/// Serves tracks whose title contains the query and writes a small file for every fetch
struct CannedLibrary {
    tracks: Vec<Track>,
}

#[async_trait]
impl TrackSearcher for CannedLibrary {
    async fn search(&self, query: &str) -> Vec<Track> {
        let query = query.to_lowercase();
        self.tracks
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AudioFetcher for CannedLibrary {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, FetchError> {
        let track = self
            .tracks
            .iter()
            .find(|t| t.url == url)
            .ok_or(FetchError::FileNotProduced)?;
        let path = destination.join(format!("{}.mp3", track.title));
        tokio::fs::write(&path, b"ID3fake").await?;
        Ok(path)
    }
}

fn controller_with(
    chat: Arc<FakeChat>,
    library: Arc<CannedLibrary>,
    root: &Path,
) -> MusicController {
    MusicController::new(
        chat,
        library.clone(),
        library,
        Arc::new(SessionCache::new()),
        root.to_path_buf(),
    )
}

#[tokio::test]
async fn test_search_then_download_flow() -> Result<()> {
    let root = tempfile::tempdir()?;
    let chat = Arc::new(FakeChat::default());
    let library = Arc::new(CannedLibrary {
        tracks: vec![
            Track::new("q1", "Queen - Bohemian Rhapsody", 355),
            Track::new("q2", "Queen - Under Pressure", 248),
        ],
    });
    let controller = controller_with(chat.clone(), library, root.path());

    let outcome = controller.handle_query(100, 42, "queen").await;
    assert_eq!(outcome, Outcome::ResultsShown { count: 2 });

    let events = chat.events();
    let Some(Event::Choices(entries)) = events.last() else {
        return Err(anyhow!("expected choices, got {events:?}"));
    };
    assert_eq!(entries[0].label, "🎵 Queen - Bohemian Rhapsody  [5:55]");
    assert_eq!(entries[1].payload, download_payload("q2"));

    let status = StatusMessage {
        chat_id: 100,
        message_id: 7,
    };
    let payload = entries[1].payload.clone();
    let outcome = controller.handle_selection(status, 42, &payload).await;
    assert_eq!(outcome, Outcome::Delivered);

    let events = chat.events();
    assert!(events.contains(&Event::Audio {
        file_name: "Queen - Under Pressure.mp3".to_string(),
        size: 7,
    }));
    assert_eq!(events.last(), Some(&Event::Delete));
    assert_eq!(std::fs::read_dir(root.path())?.count(), 0);

    // Selections stay valid until the next search
    let again = controller.handle_selection(status, 42, &payload).await;
    assert_eq!(again, Outcome::Delivered);
    Ok(())
}

#[tokio::test]
async fn test_second_search_invalidates_first() -> Result<()> {
    let root = tempfile::tempdir()?;
    let chat = Arc::new(FakeChat::default());
    let library = Arc::new(CannedLibrary {
        tracks: vec![
            Track::new("old", "Old Song", 100),
            Track::new("new", "New Song", 100),
        ],
    });
    let controller = controller_with(chat.clone(), library, root.path());

    assert_eq!(
        controller.handle_query(1, 9, "old").await,
        Outcome::ResultsShown { count: 1 }
    );
    assert_eq!(
        controller.handle_query(1, 9, "new").await,
        Outcome::ResultsShown { count: 1 }
    );

    let status = StatusMessage {
        chat_id: 1,
        message_id: 7,
    };
    let outcome = controller
        .handle_selection(status, 9, &download_payload("old"))
        .await;
    assert_eq!(outcome, Outcome::SessionExpired);
    assert_eq!(
        chat.events().last(),
        Some(&Event::Edit("⚠️ Session expired. Please search again.".to_string()))
    );

    let outcome = controller
        .handle_selection(status, 9, &download_payload("new"))
        .await;
    assert_eq!(outcome, Outcome::Delivered);
    Ok(())
}

#[test]
fn test_parse_search_output_end_to_end() {
    let stdout = [
        r#"{"id":"a","title":"Short","duration":59}"#,
        r#"{"id":"b","title":"Too long","duration":3600}"#,
        "not json",
        r#"{"id":"c","duration":600.0}"#,
        r#"{"id":"d","title":"Live stream"}"#,
    ]
    .join("\n");

    let tracks = parse_search_output(&stdout);
    let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["a", "c", "d"]);
    assert_eq!(tracks[1].title, "Unknown");
    assert_eq!(tracks[1].duration_fmt, "10:00");
    assert_eq!(tracks[2].duration_fmt, "0:00");
    assert_eq!(tracks[0].url, "https://www.youtube.com/watch?v=a");
}

#[cfg(unix)]
#[tokio::test]
async fn test_ytdlp_client_against_stub_binary() -> Result<()> {
    use oxide_music_bot::media::YtdlpClient;
    use std::os::unix::fs::PermissionsExt;

    let scratch = tempfile::tempdir()?;
    let script = scratch.path().join("yt-dlp");
    std::fs::write(
        &script,
        r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "--output" ]; then out="$arg"; fi
  prev="$arg"
done
if [ -n "$out" ]; then
  printf 'ID3' > "$(dirname "$out")/Stub Song.mp3"
  exit 0
fi
echo '{"id":"s1","title":"Stub Song","duration":61}'
echo '{"id":"s2","title":"Marathon","duration":601}'
"#,
    )?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

    let client = YtdlpClient::new(script.to_string_lossy().to_string());

    let tracks = client.search("anything; rm -rf /").await;
    assert_eq!(tracks, vec![Track::new("s1", "Stub Song", 61)]);

    let dest = scratch.path().join("mbot_s1");
    tokio::fs::create_dir_all(&dest).await?;
    let file = client.fetch(&tracks[0].url, &dest).await?;
    assert_eq!(file, dest.join("Stub Song.mp3"));
    Ok(())
}
