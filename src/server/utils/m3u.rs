use crate::database::Channel;

/// name given to a media line when nothing (usable) came before it
pub const UNKNOWN_CHANNEL_NAME: &str = "unknown";

const EXTINF_TAG: &str = "#EXTINF";

/// single forward pass over an m3u document.
///
/// `#EXTINF` lines set the pending name to whatever follows their last comma (attributes like
/// `tvg-logo="a,b"` can contain commas, titles conventionally come last). any other line that isn't
/// blank and doesn't start with `#` is a media url and takes the pending name, which then goes
/// back to `unknown`. everything else is ignored
pub fn parse_m3u(text: &str) -> Vec<Channel> {
    let mut channels = Vec::new();
    let mut pending_name: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();

        if line.starts_with(EXTINF_TAG) {
            pending_name = line
                .rsplit_once(',')
                .map(|(_, title)| title.trim())
                .filter(|title| !title.is_empty())
                .map(str::to_string);
        } else if !line.is_empty() && !line.starts_with('#') {
            channels.push(Channel {
                name: pending_name
                    .take()
                    .unwrap_or_else(|| UNKNOWN_CHANNEL_NAME.to_string()),
                url: line.to_string(),
            });
        }
    }

    channels
}

/// writes channels back out as an extended m3u document that [`parse_m3u`] reads back verbatim
pub fn render_m3u(channels: &[Channel]) -> String {
    let mut out = String::from("#EXTM3U\n");
    for channel in channels {
        out.push_str(EXTINF_TAG);
        out.push_str(":-1,");
        out.push_str(&channel.name);
        out.push('\n');
        out.push_str(&channel.url);
        out.push('\n');
    }
    out
}
