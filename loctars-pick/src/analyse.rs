use log::{debug, error};

use loctars_loci::{Superlocus, remove_fragments};
use loctars_scoring::PickConfig;

///
/// Run the full decomposition of one input superlocus.
///
/// The superlocus is split by strand and loci are defined for every
/// component. A component whose decomposition fails is logged and dropped;
/// its siblings are kept. Fragments are then flagged, or removed when the
/// configuration asks for it.
///
/// # Arguments
///
/// - slocus: an unstranded superlocus from the input grouping
/// - config: the picking configuration
///
/// # Returns
///
/// The stranded superloci with their loci defined, in genomic order.
///
pub fn analyse_locus(slocus: Superlocus, config: &PickConfig) -> Vec<Superlocus> {
    let id = slocus.id();
    debug!("Analysing {}", slocus);

    let components = match slocus.split_strands() {
        Ok(components) => components,
        Err(e) => {
            error!("Failed to split {} by strand: {}", id, e);
            return Vec::new();
        }
    };

    let mut defined: Vec<Superlocus> = Vec::with_capacity(components.len());
    for mut component in components {
        match component.define_loci(config) {
            Ok(()) => defined.push(component),
            Err(e) => error!("Dropping {}: {}", component.id(), e),
        }
    }

    let options = &config.run_options;
    let fragments = remove_fragments(
        &mut defined,
        options.fragments_maximal_cds,
        options.remove_overlapping_fragments,
    );
    if fragments > 0 {
        debug!("Found {} fragments in {}", fragments, id);
    }
    defined
}
