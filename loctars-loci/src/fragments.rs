use log::debug;

use crate::locus::Locus;
use crate::superlocus::Superlocus;

///
/// Flag or remove monoexonic loci that look like fragments of a multiexonic
/// locus, across all the given superloci.
///
/// Candidates are collected first and acted upon afterwards, so the result
/// does not depend on the order of the superloci.
///
/// # Arguments
///
/// - superloci: superloci whose loci have been defined
/// - maximal_cds: a monoexonic locus with a CDS at least this long is never a fragment
/// - remove: drop the fragments instead of flagging them
///
/// # Returns
///
/// The number of fragments found.
///
pub fn remove_fragments(superloci: &mut [Superlocus], maximal_cds: u32, remove: bool) -> usize {
    let mut fragments: Vec<(usize, String)> = Vec::new();
    {
        let loci: Vec<(usize, &Locus)> = superloci
            .iter()
            .enumerate()
            .flat_map(|(index, s)| s.loci().iter().map(move |l| (index, l)))
            .collect();
        let (mono, multi): (Vec<_>, Vec<_>) = loci.into_iter().partition(|(_, l)| l.monoexonic());

        for (index, candidate) in mono.iter() {
            if let Some((_, host)) = multi
                .iter()
                .find(|(_, host)| host.other_is_fragment(candidate, maximal_cds))
            {
                debug!("{} is a fragment of {}", candidate.id, host.id);
                fragments.push((*index, candidate.id.clone()));
            }
        }
    }

    for (index, locus_id) in fragments.iter() {
        let loci = superloci[*index].loci_mut();
        if remove {
            loci.retain(|l| &l.id != locus_id);
        } else if let Some(locus) = loci.iter_mut().find(|l| &l.id == locus_id) {
            locus.is_fragment = true;
        }
    }
    fragments.len()
}
