use rand::seq::SliceRandom;

/// User agents paired with the platform string a real browser would report
/// alongside them. Mixing them up is itself an automation tell.
const USER_AGENTS: &[(&str, &str)] = &[
    (
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Win32",
    ),
    (
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "MacIntel",
    ),
    (
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Linux x86_64",
    ),
];

/// Common desktop viewport sizes.
const VIEWPORTS: &[(u32, u32)] = &[(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// The identity one browser session presents to the site.
///
/// Challenge interstitials key on automation tells; drawing a fresh
/// user-agent/platform/viewport combination per session keeps repeated
/// crawls from presenting an identical surface.
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    /// User-agent string reported on every request
    pub user_agent: String,
    /// Navigator platform matching the user agent
    pub platform: String,
    /// Accept-Language header value
    pub accept_language: String,
    /// Viewport width in pixels
    pub viewport_width: u32,
    /// Viewport height in pixels
    pub viewport_height: u32,
}

impl FingerprintConfig {
    /// Draw a randomized fingerprint for a new session.
    #[must_use]
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();
        let (user_agent, platform) = USER_AGENTS
            .choose(&mut rng)
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        let (viewport_width, viewport_height) =
            VIEWPORTS.choose(&mut rng).copied().unwrap_or(VIEWPORTS[0]);

        Self {
            user_agent: user_agent.to_string(),
            platform: platform.to_string(),
            accept_language: ACCEPT_LANGUAGE.to_string(),
            viewport_width,
            viewport_height,
        }
    }
}
