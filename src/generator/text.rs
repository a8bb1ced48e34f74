use super::{single_line, PlaylistGenerator};
use crate::models::ChannelRecord;

/// `name,#url` listing, one channel per line
#[derive(Debug, Default, Clone, Copy)]
pub struct TextGenerator;

impl PlaylistGenerator for TextGenerator {
    fn generate(&self, records: &[ChannelRecord]) -> String {
        records
            .iter()
            .map(|record| format!("{},#{}\n", single_line(&record.name), single_line(&record.url)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestor::parse;
    use crate::models::SourceFormat;

    #[test]
    fn test_text_output() {
        let records = vec![
            ChannelRecord::new("CNN", "http://x/cnn.m3u8", "s", 1),
            ChannelRecord::new("BBC", "http://x/bbc.ts", "s", 1),
        ];
        let output = TextGenerator.generate(&records);
        assert_eq!(output, "CNN,#http://x/cnn.m3u8\nBBC,#http://x/bbc.ts\n");

        let reparsed = parse(&output, SourceFormat::Auto, "s", 1);
        assert_eq!(reparsed.len(), 2);
        assert_eq!(reparsed[1].url, "http://x/bbc.ts");
    }

    #[test]
    fn test_empty_catalog() {
        assert_eq!(TextGenerator.generate(&[]), "");
    }
}
