//! Platform → emulator core table.
//!
//! Each playable platform lists its supported cores in preference order; the
//! first one is the default. The control scheme is the runtime's own system
//! identifier for the platform.

/// Cores that only run with multi-threading (SharedArrayBuffer) enabled.
const THREADED_CORES: &[&str] = &["ppsspp"];

/// Static description of a playable platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    pub slugs: &'static [&'static str],
    pub control_scheme: &'static str,
    pub cores: &'static [&'static str],
}

impl PlatformProfile {
    pub fn default_core(&self) -> &'static str {
        self.cores[0]
    }

    pub fn supports(&self, core: &str) -> bool {
        self.cores.contains(&core)
    }

    /// Picks the requested core if this platform supports it, otherwise the
    /// default core. Never fails.
    pub fn resolve_core(&self, requested: Option<&str>) -> &'static str {
        requested
            .and_then(|core| self.cores.iter().find(|c| **c == core).copied())
            .unwrap_or_else(|| self.default_core())
    }
}

static PLATFORMS: &[PlatformProfile] = &[
    PlatformProfile { slugs: &["nes", "famicom"], control_scheme: "nes", cores: &["fceumm", "nestopia"] },
    PlatformProfile { slugs: &["snes", "sfam"], control_scheme: "snes", cores: &["snes9x"] },
    PlatformProfile { slugs: &["gb"], control_scheme: "gb", cores: &["gambatte", "mgba"] },
    PlatformProfile { slugs: &["gbc"], control_scheme: "gb", cores: &["gambatte", "mgba"] },
    PlatformProfile { slugs: &["gba"], control_scheme: "gba", cores: &["mgba"] },
    PlatformProfile { slugs: &["n64"], control_scheme: "n64", cores: &["mupen64plus_next", "parallel_n64"] },
    PlatformProfile { slugs: &["nds"], control_scheme: "nds", cores: &["melonds", "desmume", "desmume2015"] },
    PlatformProfile { slugs: &["virtualboy"], control_scheme: "vb", cores: &["beetle_vb"] },
    PlatformProfile { slugs: &["psx", "ps"], control_scheme: "psx", cores: &["pcsx_rearmed", "mednafen_psx_hw"] },
    PlatformProfile { slugs: &["psp"], control_scheme: "psp", cores: &["ppsspp"] },
    PlatformProfile {
        slugs: &["genesis", "genesis-slash-megadrive", "megadrive"],
        control_scheme: "segaMD",
        cores: &["genesis_plus_gx", "picodrive"],
    },
    PlatformProfile { slugs: &["sms"], control_scheme: "segaMS", cores: &["genesis_plus_gx", "picodrive"] },
    PlatformProfile { slugs: &["gamegear"], control_scheme: "segaGG", cores: &["genesis_plus_gx"] },
    PlatformProfile { slugs: &["segacd"], control_scheme: "segaCD", cores: &["genesis_plus_gx", "picodrive"] },
    PlatformProfile { slugs: &["sega32", "sega32x"], control_scheme: "sega32x", cores: &["picodrive"] },
    PlatformProfile { slugs: &["saturn"], control_scheme: "segaSaturn", cores: &["yabause"] },
    PlatformProfile { slugs: &["atari2600"], control_scheme: "atari2600", cores: &["stella2014"] },
    PlatformProfile { slugs: &["atari7800"], control_scheme: "atari7800", cores: &["prosystem"] },
    PlatformProfile { slugs: &["lynx"], control_scheme: "lynx", cores: &["handy"] },
    PlatformProfile { slugs: &["jaguar"], control_scheme: "jaguar", cores: &["virtualjaguar"] },
    PlatformProfile {
        slugs: &["tg16", "turbografx16--1", "pc-engine"],
        control_scheme: "pce",
        cores: &["mednafen_pce"],
    },
    PlatformProfile { slugs: &["neo-geo-pocket", "neo-geo-pocket-color"], control_scheme: "ngp", cores: &["mednafen_ngp"] },
    PlatformProfile { slugs: &["wonderswan", "wonderswan-color"], control_scheme: "ws", cores: &["mednafen_wswan"] },
    PlatformProfile { slugs: &["3do"], control_scheme: "3do", cores: &["opera"] },
    PlatformProfile { slugs: &["colecovision"], control_scheme: "coleco", cores: &["gearcoleco"] },
    PlatformProfile { slugs: &["c64"], control_scheme: "c64", cores: &["vice_x64sc"] },
    PlatformProfile { slugs: &["amiga"], control_scheme: "amiga", cores: &["puae"] },
    PlatformProfile { slugs: &["dos"], control_scheme: "dos", cores: &["dosbox_pure"] },
    PlatformProfile {
        slugs: &["arcade", "neogeoaes", "neogeomvs", "cps1", "cps2", "cps3"],
        control_scheme: "arcade",
        cores: &["fbneo", "mame2003_plus"],
    },
];

/// Looks up a platform by slug (case-insensitive, aliases included).
pub fn find_platform(slug: &str) -> Option<&'static PlatformProfile> {
    let slug = slug.to_ascii_lowercase();
    PLATFORMS
        .iter()
        .find(|p| p.slugs.iter().any(|s| *s == slug))
}

/// Every playable platform profile.
pub fn platforms() -> &'static [PlatformProfile] {
    PLATFORMS
}

/// Whether a core needs the runtime's multi-threaded build.
pub fn requires_threads(core: &str) -> bool {
    THREADED_CORES.contains(&core)
}
