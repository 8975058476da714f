// src/cases.rs

//! The regression catalog
//!
//! Every known-bad archive is pinned here as data: where the fixture comes
//! from, how big it must be, and what each reader variant is expected to
//! do with it on listing and on extraction. Divergences between variants
//! that are currently tolerated carry an explicit tag so they stay visible
//! on every run.
//!
//! Beyond the remote fixtures the catalog carries crafted in-repo archives
//! (a truncated one without an end-of-directory record, and one whose
//! entry name climbs out of the extraction directory) and a builder
//! round-trip that stages deterministic content, packs it with the
//! external archive builder and checks each variant restores it
//! byte-for-byte.

use crate::artifacts::{TestIdentity, synthetic_text, write_file};
use crate::fixtures::FetchOutcome;
use crate::harness::Harness;
use crate::runner::RunOptions;
use crate::suite::{CaseError, CaseResult, TestCase, ensure};
use crate::toolchain::ReaderVariant;
use crate::verify::{self, CveCase, OpCheck, VariantCheck};
use nix::errno::Errno;
use std::path::Path;
use std::rc::Rc;

const POC_SOURCE: &str = "https://github.com/asarubbo/poc/blob/master";
const FUZZ_SOURCE: &str = "https://github.com/ProbeFuzzer/poc/blob/master/zziplib";
const IMAGE_SOURCE: &str = "https://github.com/fantasy7082/image_test/blob/master";
const MAILED_SOURCE: &str = "https://github.com/ret2libc/---provided-by-email---";
const EVIL_SOURCE: &str = "https://github.com/gdraheim/zziplib/files/2415382";

/// All pinned regression fixtures with their per-variant expectations
pub fn catalog() -> Vec<CveCase> {
    vec![
        // Heap overflow in the 32-bit field reader. Every variant but mix
        // recovers the single stored entry.
        CveCase {
            name: "cve20175974",
            source: POC_SOURCE,
            fixture: "00150-zziplib-heapoverflow-__zzip_get32",
            fixture_size: Some(161),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 9])
                        .stdout_has(" 1 file")
                        .stdout_under(330)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_has(" extracting: test")
                        .stdout_under(90)
                        .quiet_stderr()
                        .writes("test", 3),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0])
                        .stdout_has(" stored test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes("test", 3),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0])
                        .stdout_has(" 3 test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0]).stdout_under(30).writes("test", 3),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0])
                        .stdout_has(" 3 test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes("test", 0)
                        .known_divergence(
                            "mix writes a zero-length test entry where its siblings recover 3 bytes",
                        ),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 255])
                        .stdout_has(" 3 test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes("test", 3),
                ),
            ],
        },
        // Heap overflow in the 64-bit field reader. The archive is short
        // ten bytes; no variant may materialize the entry.
        CveCase {
            name: "cve20175975",
            source: POC_SOURCE,
            fixture: "00151-zziplib-heapoverflow-__zzip_get64",
            fixture_size: Some(151),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 2])
                        .stdout_has(" 1 file")
                        .stdout_under(330)
                        .stderr_has(" missing 10 bytes in zipfile")
                        .stderr_has(
                            "didn't find end-of-central-dir signature at end of central dir",
                        )
                        .stderr_noise_under(430),
                    OpCheck::exits(&[2, 12])
                        .stdout_under(90)
                        .stderr_noise_under(900)
                        .stderr_has_any(&[
                            "file #1:  bad zipfile offset (local header sig):  127",
                            "invalid zip file with overlapped components (possible zip bomb)",
                        ])
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0])
                        .stdout_has(" stored test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes("test", 0)
                        .known_divergence(
                            "big still creates an empty test entry from the truncated archive",
                        ),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0])
                        .stdout_under(1)
                        .stderr_has("zzip_mem_disk_load : unable to load entry")
                        .stderr_has("zzip_mem_disk_open : unable to load disk")
                        .stderr_noise_under(180),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(200)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .stderr_noise_under(180)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .stderr_noise_under(200)
                        .errno(Errno::EILSEQ)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(180),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_noise_under(200)
                        .stderr_has("Zipfile corrupted")
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Heap overflow reading an extra block. The archive carries 27
        // surplus bytes; the oracle complains but still recovers the
        // entry, as do all variants except mix.
        CveCase {
            name: "cve20175976",
            source: POC_SOURCE,
            fixture: "00152-zziplib-heapoverflow-zzip_mem_entry_extra_block",
            fixture_size: Some(188),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 2])
                        .stdout_has(" 1 file")
                        .stdout_under(330)
                        .stderr_has(" 27 extra bytes at beginning or within zipfile")
                        .stderr_has(
                            "didn't find end-of-central-dir signature at end of central dir",
                        )
                        .stderr_noise_under(500),
                    OpCheck::exits(&[2])
                        .stdout_has("extracting: test")
                        .stdout_under(190)
                        .stderr_has("-27 bytes too long")
                        .stderr_noise_under(900)
                        .writes("test", 3),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0])
                        .stdout_has(" stored test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes("test", 3),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0])
                        .stdout_has(" 3 test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(30)
                        .writes("test", 3),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0])
                        .stdout_has(" 3 test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(30)
                        .writes("test", 0)
                        .known_divergence(
                            "mix writes a zero-length test entry where its siblings recover 3 bytes",
                        ),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 255])
                        .stdout_has(" 3 test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(30)
                        .writes("test", 3),
                ),
            ],
        },
        // Invalid read while parsing an extra block. The oracle rejects
        // the archive outright; the variants disagree on how many bytes
        // of the entry survive.
        CveCase {
            name: "cve20175977",
            source: POC_SOURCE,
            fixture: "00153-zziplib-invalidread-zzip_mem_entry_extra_block",
            fixture_size: Some(163),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(280)
                        .stderr_has(
                            " didn't find end-of-central-dir signature at end of central dir",
                        )
                        .stderr_has(" 2 extra bytes at beginning or within zipfile"),
                    OpCheck::exits(&[2])
                        .stdout_under(101)
                        .stderr_noise_under(900)
                        .stderr_has("test:  mismatching \"local\" filename")
                        .writes("test", 0),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0])
                        .stdout_has(" stored test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes("test", 0),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0])
                        .stdout_has(" 3 test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0]).stdout_under(30).writes("test", 3),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0])
                        .stdout_has(" 3 test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes("test", 0),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 255])
                        .stdout_has(" 3 test")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes("test", 3)
                        .known_divergence(
                            "zap recovers 3 bytes here while big and mix write empty entries",
                        ),
                ),
            ],
        },
        // Out-of-bounds read building an in-memory entry. The central
        // directory points far outside the file; every variant must reject
        // without writing anything.
        CveCase {
            name: "cve20175978",
            source: POC_SOURCE,
            fixture: "00156-zziplib-oobread-zzip_mem_entry_new",
            fixture_size: Some(161),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(80)
                        .stderr_has(" missing 4608 bytes in zipfile")
                        .stderr_has(" attempt to seek before beginning of zipfile")
                        .stderr_noise_under(430),
                    OpCheck::exits(&[3])
                        .stdout_under(90)
                        .stderr_noise_under(900)
                        .stderr_has("attempt to seek before beginning of zipfile")
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0])
                        .stdout_has(" stored (null)")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0, 1])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0])
                        .stdout_under(1)
                        .stderr_has("zzip_mem_disk_open : unable to load disk")
                        .stderr_noise_under(180),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(300)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .stderr_noise_under(180)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .stderr_noise_under(300)
                        .errno(Errno::EILSEQ)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[3])
                        .stdout_under(1)
                        .stderr_noise_under(180),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_noise_under(300)
                        .stderr_has("Zipfile corrupted")
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Null-pointer dereference in the directory prescan. The archive
        // itself is readable; the regression is about surviving the scan.
        CveCase {
            name: "cve20175979",
            source: POC_SOURCE,
            fixture: "00157-zziplib-nullptr-prescan_entry",
            fixture_size: Some(155),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0])
                        .stdout_has(" 1 file")
                        .stdout_under(330)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_has("extracting: a")
                        .stdout_under(90)
                        .quiet_stderr()
                        .writes("a", 3),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0])
                        .stdout_has(" stored a")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes("a", 3),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0])
                        .stdout_has(" 3 a")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0]).stdout_under(30).writes("a", 3),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0])
                        .stdout_has(" 3 a")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(20)
                        .writes("a", 0)
                        .known_divergence(
                            "mix writes a zero-length entry where its siblings recover 3 bytes",
                        ),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 255])
                        .stdout_has(" 3 a")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(20)
                        .writes("a", 3),
                ),
            ],
        },
        // Null-pointer dereference building an in-memory entry. The
        // archive is short six bytes and its entry name is unreadable;
        // nothing may be written.
        CveCase {
            name: "cve20175980",
            source: POC_SOURCE,
            fixture: "00154-zziplib-nullptr-zzip_mem_entry_new",
            fixture_size: Some(155),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 2])
                        .stdout_has(" 1 file")
                        .stdout_under(330)
                        .stderr_has(" missing 6 bytes in zipfile")
                        .stderr_has(
                            "didn't find end-of-central-dir signature at end of central dir",
                        )
                        .stderr_noise_under(500),
                    OpCheck::exits(&[3, 12])
                        .stdout_under(90)
                        .stderr_noise_under(900)
                        .stderr_has_any(&[
                            "file #1:  bad zipfile offset (lseek)",
                            "invalid zip file with overlapped components (possible zip bomb)",
                        ])
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0])
                        .stdout_has(" stored (null)")
                        .stdout_under(30)
                        .quiet_stderr(),
                    OpCheck::exits(&[0, 1])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0])
                        .stdout_under(1)
                        .stderr_has("unable to load disk")
                        .stderr_noise_under(180),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(200)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[2])
                        .stdout_under(1)
                        .stderr_noise_under(180)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[2])
                        .stdout_under(30)
                        .stderr_noise_under(200)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[3])
                        .stdout_under(1)
                        .stderr_noise_under(180),
                    OpCheck::exits(&[3])
                        .stdout_under(30)
                        .stderr_noise_under(200)
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Assertion failure in the seek layer. The archive is short four
        // bytes; every variant must reject it without writing.
        CveCase {
            name: "cve20175981",
            source: POC_SOURCE,
            fixture: "00161-zziplib-assertionfailure-seeko_C",
            fixture_size: Some(157),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(80)
                        .stderr_has(" missing 4 bytes in zipfile")
                        .stderr_has("zipfile corrupt")
                        .stderr_noise_under(500),
                    OpCheck::exits(&[3])
                        .stdout_under(90)
                        .stderr_noise_under(500)
                        .stderr_has("zipfile corrupt.")
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0]).stdout_under(1).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_under(1).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(80),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Invalid memory access walking the central directory. The
        // trailer is gone entirely; every variant reports an empty
        // archive or rejects it.
        CveCase {
            name: "cve201810",
            source: FUZZ_SOURCE,
            fixture: "zziplib_0-13-67_zzdir_invalid-memory-access_main.zip",
            fixture_size: Some(188),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 9])
                        .stdout_under(80)
                        .stderr_has("End-of-central-directory signature not found")
                        .stderr_noise_under(600),
                    OpCheck::exits(&[9])
                        .stdout_under(90)
                        .stderr_noise_under(600)
                        .stderr_has("End-of-central-directory signature not found")
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0]).stdout_under(1).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_under(1).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(80),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Infinite loop in the cat path. The harness timeout is the real
        // guard here; expectations pin the fixed behavior.
        CveCase {
            name: "cve201811",
            source: FUZZ_SOURCE,
            fixture: "zziplib_0-13-67_unzzip_infinite-loop_unzzip_cat_file.zip",
            fixture_size: Some(280),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 9])
                        .stdout_under(90)
                        .stderr_has("End-of-central-directory signature not found")
                        .stderr_noise_under(600),
                    OpCheck::exits(&[9])
                        .stdout_under(90)
                        .stderr_noise_under(600)
                        .stderr_has("End-of-central-directory signature not found")
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0]).stdout_under(1).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_under(1).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(90),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Buffer access with a bad length value in the in-memory reader.
        // One entry name carries a control character; the in-memory
        // listing renders it raw.
        CveCase {
            name: "cve201812",
            source: FUZZ_SOURCE,
            fixture: "zziplib_0-13-67_unzip-mem_buffer-access-with-incorrect-length-value_zzip_disk_fread.zip",
            fixture_size: Some(141),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[2])
                        .stdout_under(300)
                        .stderr_has("reported length of central directory")
                        .stderr_noise_under(800),
                    OpCheck::exits(&[2])
                        .stdout_under(300)
                        .stderr_noise_under(800)
                        .stderr_has("reported length of central directory")
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0]).stdout_under(20).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_has("2 aUT").quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .stderr_has("central directory not found"),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(200),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Misaligned reads while fetching the disk trailer. The file is
        // trailer-sized but its directory offset points backwards.
        CveCase {
            name: "cve201814",
            source: FUZZ_SOURCE,
            fixture: "zziplib_0-13-67_zzdir_memory-alignment-errors___zzip_fetch_disk_trailer.zip",
            fixture_size: Some(56),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[3])
                        .stdout_under(200)
                        .stderr_has("attempt to seek before beginning of zipfile")
                        .stderr_noise_under(800),
                    OpCheck::exits(&[3])
                        .stdout_under(200)
                        .stderr_noise_under(800)
                        .stderr_has("attempt to seek before beginning of zipfile")
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0]).stdout_under(1).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_under(1),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(200),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Misaligned reads scanning for the first entry.
        CveCase {
            name: "cve201815",
            source: FUZZ_SOURCE,
            fixture: "zziplib_0-13-67_unzip-mem_memory-alignment-errors_zzip_disk_findfirst.zip",
            fixture_size: Some(141),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[2])
                        .stdout_under(300)
                        .stderr_has("reported length of central directory")
                        .stderr_noise_under(800),
                    OpCheck::exits(&[2])
                        .stdout_under(300)
                        .stderr_noise_under(800)
                        .stderr_has("reported length of central directory")
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0]).stdout_under(15).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_under(30).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(200),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Misaligned trailer fetch through the stream reader.
        CveCase {
            name: "cve201816",
            source: FUZZ_SOURCE,
            fixture: "zziplib_0-13-67_unzzip_memory-aligment-errors___zzip_fetch_disk_trailer.zip",
            fixture_size: Some(124),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 9])
                        .stdout_under(200)
                        .stderr_has("End-of-central-directory signature not found")
                        .stderr_noise_under(800),
                    OpCheck::exits(&[9])
                        .stdout_under(200)
                        .stderr_noise_under(800)
                        .stderr_has("End-of-central-directory signature not found")
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0]).stdout_under(1).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_under(1).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(200),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .stderr_has("Zipfile corrupted")
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // 64-bit sibling of the findfirst alignment defect.
        CveCase {
            name: "cve201817",
            source: FUZZ_SOURCE,
            fixture: "zziplib_0-13-67_unzip-mem_memory-alignment-errors_zzip_disk_findfirst_64.zip",
            fixture_size: Some(360),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 9])
                        .stdout_under(200)
                        .stderr_has("End-of-central-directory signature not found")
                        .stderr_noise_under(800),
                    OpCheck::exits(&[9])
                        .stdout_under(200)
                        .stderr_noise_under(800)
                        .stderr_has("End-of-central-directory signature not found")
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0]).stdout_under(1),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_under(50).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .errno(Errno::EILSEQ)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(200),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_has("Zipfile corrupted")
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Trailer-scan bypass reported by mail. The published file is a
        // placeholder; the case skips unless the real 56-byte archive is
        // present in the developer downloads folder.
        CveCase {
            name: "cve201827",
            source: MAILED_SOURCE,
            fixture: "poc_bypass_fix2.zip",
            fixture_size: Some(56),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[0, 9])
                        .stdout_under(200)
                        .stderr_has("End-of-central-directory signature not found")
                        .stderr_noise_under(800),
                    OpCheck::exits(&[9])
                        .stdout_under(200)
                        .stderr_noise_under(800)
                        .stderr_has("End-of-central-directory signature not found")
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0]).stdout_under(1),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_under(50).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .errno(Errno::EILSEQ)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(200),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_has("Zipfile corrupted")
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Large fuzzed image whose central directory is short 5123 bytes.
        CveCase {
            name: "cve201839",
            source: IMAGE_SOURCE,
            fixture: "003-unknow-def-zip",
            fixture_size: Some(82347),
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[3])
                        .stdout_under(400)
                        .stderr_has("missing 5123 bytes in zipfile")
                        .stderr_has("expected central file header signature not found")
                        .stderr_noise_under(800),
                    OpCheck::exits(&[3, 12])
                        .stdout_under(400)
                        .stderr_noise_under(800)
                        .stderr_has("missing 5123 bytes in zipfile")
                        .stderr_has_any(&[
                            "expected central file header signature not found",
                            "invalid zip file with overlapped components (possible zip bomb)",
                        ])
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Big,
                    OpCheck::exits(&[0]).stdout_under(1),
                    OpCheck::exits(&[0])
                        .stdout_under(30)
                        .quiet_stderr()
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_under(200).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(200)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mix,
                    OpCheck::exits(&[0, 2])
                        .stdout_under(1)
                        .errno(Errno::EILSEQ),
                    OpCheck::exits(&[0, 2])
                        .stdout_under(30)
                        .errno(Errno::EILSEQ)
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Zap,
                    OpCheck::exits(&[0, 3])
                        .stdout_under(1)
                        .stderr_noise_under(200),
                    OpCheck::exits(&[0, 3])
                        .stdout_under(30)
                        .stderr_has("Zipfile corrupted")
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Memory-leak reproducer; only the oracle and the in-memory
        // reader were ever pinned against it.
        CveCase {
            name: "cve201840",
            source: IMAGE_SOURCE,
            fixture: "002-mem-leaks-zip",
            fixture_size: None,
            variants: vec![
                VariantCheck::new(
                    ReaderVariant::Oracle,
                    OpCheck::exits(&[3])
                        .stdout_under(2500)
                        .stderr_has("missing 21 bytes in zipfile")
                        .stderr_noise_under(800),
                    OpCheck::exits(&[3, 12])
                        .stdout_under(2500)
                        .stderr_noise_under(800)
                        .stderr_has("missing 21 bytes in zipfile")
                        .stderr_has_any(&[
                            "expected central file header signature not found",
                            "invalid zip file with overlapped components (possible zip bomb)",
                        ])
                        .writes_nothing_at("test"),
                ),
                VariantCheck::new(
                    ReaderVariant::Mem,
                    OpCheck::exits(&[0]).stdout_under(1500).quiet_stderr(),
                    OpCheck::exits(&[0])
                        .stdout_under(1500)
                        .stderr_noise_under(10)
                        .writes_nothing_at("test"),
                ),
            ],
        },
        // Bus error parsing the root directory (CVE-2018-7726). Only the
        // oracle's reading of the file is pinned.
        CveCase {
            name: "cve201841",
            source: IMAGE_SOURCE,
            fixture: "c005-bus-zzip_parse_root_directory",
            fixture_size: None,
            variants: vec![VariantCheck::new(
                ReaderVariant::Oracle,
                OpCheck::exits(&[0, 3])
                    .stdout_under(200)
                    .stderr_has("missing 20 bytes in zipfile")
                    .stderr_noise_under(800),
                OpCheck::exits(&[3])
                    .stdout_under(200)
                    .stderr_noise_under(800)
                    .stderr_has("missing 20 bytes in zipfile")
                    .stderr_has("attempt to seek before beginning of zipfile")
                    .writes_nothing_at("test"),
            )],
        },
        CveCase {
            name: "cve201842",
            source: IMAGE_SOURCE,
            fixture: "c006-unknown-add-main",
            fixture_size: None,
            variants: vec![VariantCheck::new(
                ReaderVariant::Oracle,
                OpCheck::exits(&[3])
                    .stdout_under(200)
                    .stderr_has("missing 18 bytes in zipfile")
                    .stderr_noise_under(800),
                OpCheck::exits(&[3, 12])
                    .stdout_under(200)
                    .stderr_noise_under(800)
                    .stderr_has("missing 18 bytes in zipfile")
                    .stderr_has_any(&[
                        "expected central file header signature not found",
                        "invalid zip file with overlapped components (possible zip bomb)",
                    ])
                    .writes_nothing_at("test"),
            )],
        },
        CveCase {
            name: "cve201843",
            source: IMAGE_SOURCE,
            fixture: "c008-main-unknown-de",
            fixture_size: None,
            variants: vec![VariantCheck::new(
                ReaderVariant::Oracle,
                OpCheck::exits(&[3])
                    .stdout_under(500)
                    .stderr_has("missing 18 bytes in zipfile")
                    .stderr_noise_under(800),
                OpCheck::exits(&[3, 12])
                    .stdout_under(400)
                    .stderr_noise_under(800)
                    .stderr_has("missing 18 bytes in zipfile")
                    .stderr_has_any(&[
                        "expected central file header signature not found",
                        "invalid zip file with overlapped components (possible zip bomb)",
                    ])
                    .writes_nothing_at("test"),
            )],
        },
        // Published traversal archive whose entry names start with "../"
        // (CVE-2018-17828). Listing is pinned here; the containment of its
        // extraction has a dedicated case.
        CveCase {
            name: "cve201817828",
            source: EVIL_SOURCE,
            fixture: "evil.zip",
            fixture_size: None,
            variants: vec![VariantCheck::list_only(
                ReaderVariant::Mem,
                OpCheck::exits(&[0, 80]).stdout_under(500).quiet_stderr(),
            )],
        },
    ]
}

/// Every (source, filename) pair in the catalog, for prefetching
pub fn fixture_sources() -> Vec<(&'static str, &'static str)> {
    catalog()
        .iter()
        .map(|case| (case.source, case.fixture))
        .collect()
}

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// A local header and stored data with the trailing directory records cut
/// off, as left behind by an interrupted writer
fn crafted_missing_trailer() -> Vec<u8> {
    let name = b"test";
    let data = b"moo";
    let mut buf = Vec::new();
    buf.extend_from_slice(b"PK\x03\x04");
    push_u16(&mut buf, 20); // version needed
    push_u16(&mut buf, 0); // flags
    push_u16(&mut buf, 0); // stored
    push_u16(&mut buf, 0); // mod time
    push_u16(&mut buf, 0); // mod date
    push_u32(&mut buf, 0); // crc, never checked before the trailer scan
    push_u32(&mut buf, data.len() as u32);
    push_u32(&mut buf, data.len() as u32);
    push_u16(&mut buf, name.len() as u16);
    push_u16(&mut buf, 0); // extra length
    buf.extend_from_slice(name);
    buf.extend_from_slice(data);
    // garbage tail where the directory records should start
    buf.resize(56, 0);
    buf
}

/// A well-formed archive whose single entry name climbs out of the
/// extraction directory
fn crafted_traversal() -> Vec<u8> {
    let name = b"../evil.txt";
    let mut buf = Vec::new();
    // local header, empty stored entry
    buf.extend_from_slice(b"PK\x03\x04");
    push_u16(&mut buf, 20);
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 0);
    push_u32(&mut buf, 0); // crc of empty data
    push_u32(&mut buf, 0);
    push_u32(&mut buf, 0);
    push_u16(&mut buf, name.len() as u16);
    push_u16(&mut buf, 0);
    buf.extend_from_slice(name);
    let central_offset = buf.len() as u32;
    // central directory entry
    buf.extend_from_slice(b"PK\x01\x02");
    push_u16(&mut buf, 20); // version made by
    push_u16(&mut buf, 20); // version needed
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 0);
    push_u32(&mut buf, 0);
    push_u32(&mut buf, 0);
    push_u32(&mut buf, 0);
    push_u16(&mut buf, name.len() as u16);
    push_u16(&mut buf, 0); // extra length
    push_u16(&mut buf, 0); // comment length
    push_u16(&mut buf, 0); // disk number
    push_u16(&mut buf, 0); // internal attributes
    push_u32(&mut buf, 0); // external attributes
    push_u32(&mut buf, 0); // local header offset
    buf.extend_from_slice(name);
    let central_size = buf.len() as u32 - central_offset;
    // end of central directory
    buf.extend_from_slice(b"PK\x05\x06");
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 1);
    push_u16(&mut buf, 1);
    push_u32(&mut buf, central_size);
    push_u32(&mut buf, central_offset);
    push_u16(&mut buf, 0);
    buf
}

/// Listing an archive with no end-of-directory record
///
/// The in-memory reader walks forward from the local headers and reports
/// an empty listing with a clean exit; the oracle scans for the trailer
/// and refuses the file. Both behaviors are pinned.
fn run_missing_trailer(harness: &Harness, variant: ReaderVariant, check: &OpCheck) -> CaseResult {
    let exe = verify::resolve_reader(harness, variant)?;
    let identity = TestIdentity::new(&format!("noend_{}", variant.label()));
    let scratch = harness.workspace.scratch_dir(&identity)?;
    let outcome = (|| {
        let archive = scratch.join("noend.zip");
        std::fs::write(&archive, crafted_missing_trailer()).map_err(crate::Error::from)?;
        let exe = exe.to_string_lossy().into_owned();
        let archive = archive.to_string_lossy().into_owned();
        let mut opts = RunOptions::new().locale(&harness.config.locale);
        opts.accepted = check.accepted().clone();
        let run = harness
            .runner
            .run(&[exe.as_str(), "-l", archive.as_str()], &opts)?;
        verify::apply_checks(&run, check, &scratch)
    })();
    harness.workspace.release_scratch_dir(&identity)?;
    outcome
}

/// Extraction must stay inside the working directory even when an entry
/// name points above it. Runs two levels below the scratch root and then
/// audits that no new filesystem entry escaped.
fn run_traversal(harness: &Harness, variant: ReaderVariant) -> CaseResult {
    let exe = verify::resolve_reader(harness, variant)?;
    let identity = TestIdentity::new(&format!("traverse_{}", variant.label()));
    let scratch = harness.workspace.scratch_dir(&identity)?;
    let outcome = (|| {
        let archive = scratch.join("evil.zip");
        std::fs::write(&archive, crafted_traversal()).map_err(crate::Error::from)?;
        let workdir = scratch.join("d1/d2");
        std::fs::create_dir_all(&workdir).map_err(crate::Error::from)?;
        let before = verify::snapshot(&scratch);

        let exe = exe.to_string_lossy().into_owned();
        let argv: Vec<&str> = match variant {
            ReaderVariant::Oracle => vec![exe.as_str(), "-o", "../../evil.zip"],
            _ => vec![exe.as_str(), "../../evil.zip"],
        };
        let accept: &[i32] = match variant {
            // the oracle exits 1 after warning about the stripped prefix
            ReaderVariant::Oracle => &[0, 1],
            _ => &[0],
        };
        harness.runner.run(
            &argv,
            &RunOptions::new()
                .locale(&harness.config.locale)
                .cwd(&workdir)
                .accept(accept),
        )?;
        verify::audit_containment(&scratch, &workdir, &before)
    })();
    harness.workspace.release_scratch_dir(&identity)?;
    outcome
}

/// Extraction of the published CVE-2018-17828 archive: its entry names
/// carry a `../` prefix, which the in-memory reader must strip so the
/// files land inside the working directory two levels down.
fn run_fetched_traversal(harness: &Harness) -> CaseResult {
    let exe = verify::resolve_reader(harness, ReaderVariant::Mem)?;
    let identity = TestIdentity::new("cve201817828_traverse");
    let scratch = harness.workspace.scratch_dir(&identity)?;
    let outcome = (|| {
        let fixture = "evil.zip";
        match harness.cache.fetch(EVIL_SOURCE, fixture, Some(scratch.as_path()))? {
            FetchOutcome::Fetched(_) => {}
            FetchOutcome::Offline => {
                return Err(CaseError::Skipped(format!(
                    "downloads disabled, no {fixture}"
                )));
            }
            FetchOutcome::Unavailable => {
                return Err(CaseError::Skipped(format!("no {fixture} available")));
            }
        }
        let workdir = scratch.join("d1/d2");
        std::fs::create_dir_all(&workdir).map_err(crate::Error::from)?;
        let before = verify::snapshot(&scratch);

        let exe = exe.to_string_lossy().into_owned();
        harness.runner.run(
            &[exe.as_str(), "../../evil.zip"],
            &RunOptions::new()
                .locale(&harness.config.locale)
                .cwd(&workdir),
        )?;
        ensure(
            workdir.join("test/evil.conf").is_file(),
            "stripped entry was not restored inside the working directory",
        )?;
        verify::audit_containment(&scratch, &workdir, &before)
    })();
    harness.workspace.release_scratch_dir(&identity)?;
    outcome
}

/// Build an archive from deterministic content and restore it with one
/// variant, comparing the extracted bytes to what was staged
fn run_roundtrip(harness: &Harness, variant: ReaderVariant) -> CaseResult {
    let mkzip = harness.tools.mkzip().to_string();
    let builder = mkzip.split_whitespace().next().unwrap_or(&mkzip);
    if which::which(builder).is_err() {
        return Err(CaseError::Skipped(format!(
            "no archive builder '{builder}' on this host"
        )));
    }
    let exe = verify::resolve_reader(harness, variant)?;
    let identity = TestIdentity::new(&format!("roundtrip_{}", variant.label()));
    let scratch = harness.workspace.scratch_dir(&identity)?;
    let archive = harness.workspace.archive_path(&identity);
    let outcome = roundtrip_in_scratch(harness, variant, &exe, &scratch, &archive);
    harness.workspace.release_archive(&identity)?;
    harness.workspace.release_scratch_dir(&identity)?;
    outcome
}

fn roundtrip_in_scratch(
    harness: &Harness,
    variant: ReaderVariant,
    exe: &Path,
    scratch: &Path,
    archive: &Path,
) -> CaseResult {
    let content = synthetic_text(1024);
    write_file(&scratch.join("data/file.txt"), &content)?;

    let line = format!(
        "cd {} && {} -q {} data/file.txt",
        scratch.display(),
        harness.tools.mkzip(),
        archive.display()
    );
    let opts = RunOptions::new().locale(&harness.config.locale);
    harness.runner.run_shell(&line, &opts)?;

    let exe = exe.to_string_lossy().into_owned();
    let archive = std::path::absolute(archive)
        .map_err(crate::Error::from)?
        .to_string_lossy()
        .into_owned();
    let run = harness
        .runner
        .run(&[exe.as_str(), "-l", archive.as_str()], &opts)?;
    ensure(
        run.stdout.contains("data/file.txt"),
        format!("listing does not name the staged entry: {}", run.invocation),
    )?;

    let run = harness
        .runner
        .run(&[exe.as_str(), "-p", archive.as_str()], &opts)?;
    ensure(
        run.stdout.contains(&content),
        format!("cat did not reproduce the staged content: {}", run.invocation),
    )?;

    let out = scratch.join("out");
    std::fs::create_dir_all(&out).map_err(crate::Error::from)?;
    let argv: Vec<&str> = match variant {
        ReaderVariant::Oracle => vec![exe.as_str(), "-o", archive.as_str()],
        _ => vec![exe.as_str(), archive.as_str()],
    };
    harness.runner.run(
        &argv,
        &RunOptions::new()
            .locale(&harness.config.locale)
            .cwd(&out),
    )?;

    let restored = std::fs::read_to_string(out.join("data/file.txt")).map_err(|_| {
        CaseError::Failed("extraction did not restore data/file.txt".to_string())
    })?;
    ensure(
        restored == content,
        "restored content differs from the staged content",
    )
}

/// The complete suite in registration order: for every catalog entry one
/// fixture-size self-check and one case per variant, then the crafted
/// archives, then the builder round-trips.
pub fn all_cases() -> Vec<TestCase> {
    let mut cases = Vec::new();

    for entry in catalog() {
        let entry = Rc::new(entry);
        if entry.fixture_size.is_some() {
            let sized = Rc::clone(&entry);
            cases.push(TestCase::new(format!("{}_size", entry.name), move |h| {
                verify::run_size_check(h, &sized)
            }));
        }
        for index in 0..entry.variants.len() {
            let entry = Rc::clone(&entry);
            let name = format!("{}_{}", entry.name, entry.variants[index].variant.label());
            cases.push(TestCase::new(name, move |h| {
                verify::run_cve_variant(h, &entry, &entry.variants[index])
            }));
        }
    }

    cases.push(TestCase::new("noend_mem", |h| {
        let check = OpCheck::exits(&[0]).stdout_under(1).stderr_noise_under(180);
        run_missing_trailer(h, ReaderVariant::Mem, &check)
    }));
    cases.push(TestCase::new("noend_oracle", |h| {
        let check = OpCheck::exits(&[2, 3, 9]).stderr_has("signature not found");
        run_missing_trailer(h, ReaderVariant::Oracle, &check)
    }));

    cases.push(TestCase::new("traverse_mem", |h| {
        run_traversal(h, ReaderVariant::Mem)
    }));
    cases.push(TestCase::new("traverse_oracle", |h| {
        run_traversal(h, ReaderVariant::Oracle)
    }));
    cases.push(TestCase::new("cve201817828_traverse", run_fetched_traversal));

    for variant in ReaderVariant::ALL {
        cases.push(TestCase::new(
            format!("roundtrip_{}", variant.label()),
            move |h| run_roundtrip(h, variant),
        ));
    }

    cases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_are_unique_and_underscore_free() {
        let entries = catalog();
        for (i, a) in entries.iter().enumerate() {
            assert!(!a.name.contains('_'), "{} would split its identity", a.name);
            for b in &entries[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_catalog_variants_are_unique_per_entry() {
        for entry in catalog() {
            assert!(!entry.variants.is_empty(), "{} pins nothing", entry.name);
            for (i, a) in entry.variants.iter().enumerate() {
                for b in &entry.variants[i + 1..] {
                    assert_ne!(
                        a.variant, b.variant,
                        "{} has duplicate expectations for one variant",
                        entry.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_fully_pinned_entries_cover_every_variant() {
        // entries with five expectations must cover each reader exactly once
        let mut full = 0;
        for entry in catalog() {
            if entry.variants.len() < ReaderVariant::ALL.len() {
                continue;
            }
            full += 1;
            for variant in ReaderVariant::ALL {
                assert!(
                    entry.variants.iter().any(|v| v.variant == variant),
                    "{} has no expectation for {}",
                    entry.name,
                    variant
                );
            }
        }
        assert!(full >= 16, "only {full} fully pinned entries");
    }

    #[test]
    fn test_catalog_spans_both_advisory_years() {
        let names: Vec<&str> = catalog().iter().map(|e| e.name).collect();
        for name in [
            "cve20175974",
            "cve20175975",
            "cve20175976",
            "cve20175977",
            "cve20175978",
            "cve20175979",
            "cve20175980",
            "cve20175981",
            "cve201810",
            "cve201811",
            "cve201812",
            "cve201814",
            "cve201815",
            "cve201816",
            "cve201817",
            "cve201827",
            "cve201839",
            "cve201840",
            "cve201841",
            "cve201842",
            "cve201843",
            "cve201817828",
        ] {
            assert!(names.contains(&name), "catalog lacks {name}");
        }
    }

    #[test]
    fn test_registered_case_names_are_unique() {
        let cases = all_cases();
        for (i, a) in cases.iter().enumerate() {
            for b in &cases[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_fixture_sources_match_catalog() {
        assert_eq!(fixture_sources().len(), catalog().len());
    }

    #[test]
    fn test_crafted_missing_trailer_has_no_end_record() {
        let bytes = crafted_missing_trailer();
        assert_eq!(bytes.len(), 56);
        assert!(bytes.starts_with(b"PK\x03\x04"));
        assert!(!bytes.windows(4).any(|w| w == b"PK\x05\x06"));
    }

    #[test]
    fn test_crafted_traversal_is_well_formed() {
        let bytes = crafted_traversal();
        assert!(bytes.starts_with(b"PK\x03\x04"));
        // one central entry and a trailer at the very end
        assert!(bytes.windows(4).any(|w| w == b"PK\x01\x02"));
        assert_eq!(&bytes[bytes.len() - 22..bytes.len() - 18], b"PK\x05\x06");
        let name = b"../evil.txt";
        assert!(bytes.windows(name.len()).any(|w| w == name));
    }
}
