//! Fixtures shared by the tests: a small VCF header, data lines and writers for
//! (bgzipped and indexed) VCF files.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use noodles::bgzf;

use crate::common::io::std::is_gz;
use crate::tabix::{IndexBuilder, TabixIndex};

/// Header with the genomes `alpha` and `beta` on contigs `1` and `2`.
pub const HEADER: &str = "##fileformat=VCFv4.2
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Combined depth across samples\">
##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">
##INFO=<ID=END,Number=1,Type=Integer,Description=\"End position of the variant\">
##INFO=<ID=SVLEN,Number=.,Type=Integer,Description=\"Difference in length between REF and ALT alleles\">
##FILTER=<ID=q10,Description=\"Quality below 10\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth\">
##ALT=<ID=DEL,Description=\"Deletion\">
##contig=<ID=1,length=249250621>
##contig=<ID=2,length=243199373>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\talpha\tbeta
";

fn tabbed(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.replace(' ', "\t")).collect()
}

/// Data lines with small variants on two chromosomes.
pub fn two_chromosome_lines() -> Vec<String> {
    tabbed(&[
        "1 100 rs1 A G 50 PASS DP=20;DB GT:DP 0|1:10 1|1:12",
        "1 200 . AC A 35 PASS DP=14 GT:DP 1|0:7 0|0:9",
        "1 300 . G GTTT 12 q10 DP=5 GT:DP 0|1:3 1/0:2",
        "2 50 . T C 99 PASS DP=40 GT:DP 0/0:20 0|1:20",
        "2 80 . CAA C,CA 60 PASS DP=30 GT:DP 1|2:15 ./.:.",
    ])
}

/// Data lines spread over several index windows, with overlapping records and one
/// structural variant carrying `END`.
pub fn region_lines() -> Vec<String> {
    tabbed(&[
        "1 100 . A G 50 PASS DP=10 GT 0|1 0|0",
        "1 100 . ACGT A 40 PASS DP=11 GT 1|0 0|0",
        "1 101 . C T 30 PASS DP=12 GT 0|0 0|1",
        "1 1200 . G GA 20 PASS DP=13 GT 1|1 0|0",
        "1 20000 . T C 60 PASS DP=14 GT 0|1 0|1",
        "1 40000 . AT A 70 PASS DP=15 GT 0|0 1|1",
        "1 50000 . N <DEL> 80 PASS END=70000;SVLEN=-20000 GT 0|1 0|0",
        "1 50100 . C G 90 PASS DP=16 GT 0|0 0|1",
        "1 150000 . A T 10 q10 DP=17 GT 1|0 0|0",
        "1 150005 . A C 15 PASS DP=18 GT 0|1 0|0",
        "2 5 . A C 25 PASS DP=19 GT 0|1 0|0",
        "2 7 . ACG A 35 PASS DP=20 GT 0|0 1|0",
        "2 500000 . G T 45 PASS DP=21 GT 1|1 1|1",
    ])
}

/// Write a bgzipped VCF file, starting a new BGZF block every `lines_per_block` lines.
pub fn write_bgzf_vcf(
    path: &Path,
    header: &str,
    lines: &[String],
    lines_per_block: usize,
) -> Result<(), anyhow::Error> {
    let mut writer = bgzf::io::Writer::new(File::create(path)?);
    writer.write_all(header.as_bytes())?;
    writer.flush()?;
    for (idx, line) in lines.iter().enumerate() {
        writeln!(writer, "{}", line)?;
        if (idx + 1) % lines_per_block.max(1) == 0 {
            writer.flush()?;
        }
    }
    writer.finish()?;
    Ok(())
}

/// Write a plain-text VCF file.
pub fn write_plain_vcf(path: &Path, header: &str, lines: &[String]) -> Result<(), anyhow::Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(header.as_bytes())?;
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a bgzipped VCF file named `name` into `dir` together with its Tabix index.
pub fn write_indexed_vcf(
    dir: &Path,
    name: &str,
    header: &str,
    lines: &[String],
) -> Result<PathBuf, anyhow::Error> {
    let path = dir.join(name);
    write_bgzf_vcf(&path, header, lines, 3)?;
    IndexBuilder::build_from_path(&path)?.write(TabixIndex::path_for(&path))?;
    Ok(path)
}

/// Read a whole text file, decompressing it if it is bgzipped.
pub fn read_text(path: &Path) -> Result<String, anyhow::Error> {
    let mut text = String::new();
    if is_gz(path) {
        bgzf::io::Reader::new(File::open(path)?).read_to_string(&mut text)?;
    } else {
        File::open(path)?.read_to_string(&mut text)?;
    }
    Ok(text)
}
