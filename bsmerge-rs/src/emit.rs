use crate::annotate::{AnnotatedHit, RetainedAlignment};
use crate::reference::ReferenceNames;
use std::fmt::Write as _;
use std::io::{self, Write};

/// Mapping quality written for every record; the aligner's value is not kept.
const MAPQ: u8 = 255;

struct Mate<'a> {
    target: &'a str,
    position: u32,
    template_len: i64,
}

fn format_hit(
    out: &mut String,
    retained: &RetainedAlignment,
    hit: &AnnotatedHit,
    mate: Option<Mate<'_>>,
    names: &ReferenceNames,
) {
    let strand = retained.strand;
    let (rnext, pnext, tlen) = match &mate {
        Some(m) => (names.resolve(m.target), m.position, m.template_len),
        None => ("*", 0, 0),
    };

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t*\tNM:i:{}",
        retained.read_name,
        strand.flags().bits(),
        names.resolve(&hit.target),
        hit.position,
        MAPQ,
        hit.cigar,
        rnext,
        pnext,
        tlen,
        String::from_utf8_lossy(&hit.reference),
        hit.mismatches,
    );
    if let Some(calls) = &hit.methylation {
        let _ = write!(out, "\tXM:Z:{}", calls);
    }
    let _ = write!(
        out,
        "\tXR:Z:{}\tXG:Z:{}",
        strand.read_conversion().code(),
        strand.genome_conversion().code()
    );
    if let Some(fragment) = &retained.fragment {
        let _ = write!(
            out,
            "\tYF:{}\tYS:{}\tYE:{}",
            fragment.id, fragment.start, fragment.end
        );
    }
    out.push('\n');
}

/// Render a retained read as output lines: one for a single-end read, two
/// (mate 1 then mate 2) for a pair.
pub fn format_alignment(retained: &RetainedAlignment, names: &ReferenceNames) -> String {
    let mut out = String::new();
    match retained.hits.as_slice() {
        [hit] => format_hit(&mut out, retained, hit, None, names),
        [first, second] => {
            let insert_size = retained.insert_size.unwrap_or(0);
            format_hit(
                &mut out,
                retained,
                first,
                Some(Mate {
                    target: &second.target,
                    position: second.position,
                    template_len: insert_size,
                }),
                names,
            );
            format_hit(
                &mut out,
                retained,
                second,
                Some(Mate {
                    target: &first.target,
                    position: first.position,
                    template_len: -insert_size,
                }),
                names,
            );
        }
        hits => {
            for hit in hits {
                format_hit(&mut out, retained, hit, None, names);
            }
        }
    }
    out
}

pub fn write_alignment<W: Write>(
    writer: &mut W,
    retained: &RetainedAlignment,
    names: &ReferenceNames,
) -> io::Result<()> {
    writer.write_all(format_alignment(retained, names).as_bytes())
}
