// # Platform Adapters
//
// PlatformAdapter implementations for the four tracked ecosystems:
//
// - Battle.net, via the BlizzTrack manifest API
// - PlayStation 5 (Prospero), via ProsperoPatches
// - PlayStation 4 (Orbis), via OrbisPatches
// - Steam, via the SteamCMD info API
//
// ## Failure handling
//
// These are unofficial community APIs and single-title failures are routine.
// A transient failure that survives the transport retry, a `success: false`
// flag, or a payload missing expected fields all surface as `Ok(None)` (skip
// this cycle); only non-transient transport failures become errors.

pub mod battlenet;
pub mod playstation;
pub mod steam;

pub use battlenet::BattlenetAdapter;
pub use playstation::PlayStationAdapter;
pub use steam::SteamAdapter;

use patchwatch_core::traits::PlatformAdapter;
use patchwatch_transport::Transport;

/// All adapters in canonical processing order, sharing one transport.
pub fn all_adapters(transport: &Transport) -> Vec<Box<dyn PlatformAdapter>> {
    vec![
        Box::new(BattlenetAdapter::new(transport.clone())),
        Box::new(PlayStationAdapter::prospero(transport.clone())),
        Box::new(PlayStationAdapter::orbis(transport.clone())),
        Box::new(SteamAdapter::new(transport.clone())),
    ]
}
