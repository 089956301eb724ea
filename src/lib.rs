//! `excisionfinder` is a crate for finding allele-specific CRISPR excision
//! strategies across a cohort of phased individuals.
//!
//! A heterozygous variant can make a nuclease recognition site present on one
//! haplotype but absent from the other: the alternate allele may create a
//! site, destroy one present on the reference allele, or sit close enough to
//! one to allow differential guide design. Cutting at two such sites _on the
//! same haplotype_ excises the intervening segment from that allele only.
//! When the segment contains coding sequence, the allele is knocked out while
//! its partner survives.
//!
//! For each gene, the crate answers one question per individual and nuclease:
//! does this individual carry heterozygous variants that allow such an
//! excision?
//!
//! ## Inputs
//!
//! The crate works with three tables, each of which can be read from
//! tab-delimited text using the shared [`Reader`] facility:
//!
//! - [Transcript annotations](crate::gene::annotation::Record), from which the
//!   coding [gene structure](crate::gene::Structure) is derived.
//! - [Targetability records](crate::variant::Table), which describe the
//!   [effects](crate::variant::Effects) of each alternate allele on each
//!   [nuclease](crate::nuclease::NucleaseId)'s recognition sites.
//! - [Phased genotypes](crate::genotype::Table) of every individual.
//!
//! ## Analysis
//!
//! Most users will want [`analysis::analyze_transcript()`] (starting from an
//! annotation) or [`analysis::analyze_gene()`] (starting from a gene
//! structure), configured with an [`analysis::Config`]. Each produces an
//! [`analysis::Report`] holding either a [record](crate::cohort::Record) per
//! individual or the reason the gene [dropped out](crate::analysis::Dropout).
//!
//! The building blocks are exposed as well:
//!
//! - [`pair`] decides whether two cuts excise coding sequence and enumerates
//!   every such pair within a window.
//! - [`haplotype`] resolves which haplotype of an individual a nuclease can
//!   cut at a heterozygous site.
//! - [`cohort`] combines the two across every individual.
//!
//! ```
//! use excisionfinder::analysis;
//! use excisionfinder::analysis::Config;
//! use excisionfinder::gene::annotation::Record;
//! use excisionfinder::genotype;
//! use excisionfinder::nuclease::NucleaseId;
//! use excisionfinder::variant;
//!
//! let transcript = "NM_1\tchr1\t900\t2200\t1000\t2100\t2\t900,2000,\t1100,2200,\tGENE1\t1300"
//!     .parse::<Record>()?;
//!
//! let data = b"pos\tref\talt\tmakes_SaCas9\tbreaks_SaCas9\tvar_near_SaCas9\n\
//!              950\tA\tG\tTrue\tFalse\tFalse\n\
//!              1500\tC\tT\tTrue\tFalse\tFalse\n";
//! let mut reader = excisionfinder::Reader::new(&data[..]);
//! let variants = variant::Table::try_from_reader(
//!     &mut reader,
//!     &Default::default(),
//!     &[NucleaseId::SaCas9],
//! )?;
//!
//! let data = b"pos\tHG00096\tHG00097\n950\tG|A\tG|A\n1500\tT|C\tC|T\n";
//! let mut reader = excisionfinder::Reader::new(&data[..]);
//! let genotypes = genotype::Table::try_from_reader(&mut reader)?;
//!
//! let config = Config::try_new([NucleaseId::SaCas9])?;
//! let report = analysis::analyze_transcript(&transcript, &variants, &genotypes, &config)?;
//!
//! for record in report.records() {
//!     println!("{}: {}", record.sample(), record.any());
//! }
//!
//! assert!(report.records()[0].any());
//! assert!(!report.records()[1].any());
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod analysis;
pub mod cohort;
pub mod gene;
pub mod genotype;
pub mod haplotype;
pub mod nuclease;
pub mod pair;
pub mod reader;
pub mod variant;

pub use self::reader::Reader;
