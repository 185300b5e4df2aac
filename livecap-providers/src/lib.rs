// livecap Provider Clients
//
// Pure HTTP clients for the upstream live-room services. They know nothing
// about manifests or capture; their only job is turning a human-facing room
// number into a playable manifest URL.
//
// Architecture:
// - livecap-providers: upstream HTTP clients + the StreamResolver seam
// - livecap-core: manifest polling, segment capture, config, logging
// - livecap: CLI binary wiring the two together

pub mod bilibili;

pub use bilibili::{BilibiliLiveClient, LiveApiError, LiveClientOptions, StreamResolver};
