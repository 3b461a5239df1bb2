use crate::error::InitProcessError;

/// フィルタ文字列の最大長 (終端を含む)
pub const MAXBUF: usize = 2048;

/// コマンドライン引数を空白区切りで連結してフィルタ文字列を作る
///
/// 各引数の後ろに空白を一つ付けるため、結果は常に空白で終わる。
pub fn build_filter<S: AsRef<str>>(args: &[S]) -> Result<String, InitProcessError> {
    let mut filter = String::with_capacity(MAXBUF);

    for arg in args {
        let arg = arg.as_ref();
        if filter.len() + arg.len() + 1 >= MAXBUF {
            return Err(InitProcessError::FilterTooLong { max: MAXBUF });
        }
        filter.push_str(arg);
        filter.push(' ');
    }

    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_arguments_with_trailing_space() {
        let filter = build_filter(&["tcp.DstPort", "==", "80"]).unwrap();
        assert_eq!(filter, "tcp.DstPort == 80 ");
    }

    #[test]
    fn empty_argument_list_gives_empty_filter() {
        let filter = build_filter::<&str>(&[]).unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn longest_filter_fits_buffer() {
        let arg = "a".repeat(MAXBUF - 2);
        let filter = build_filter(&[arg]).unwrap();
        assert_eq!(filter.len(), MAXBUF - 1);
    }

    #[test]
    fn filter_reaching_buffer_size_is_rejected() {
        let arg = "a".repeat(MAXBUF - 1);
        assert!(matches!(
            build_filter(&[arg]),
            Err(InitProcessError::FilterTooLong { max: MAXBUF })
        ));
    }

    #[test]
    fn limit_applies_across_arguments() {
        let half = "b".repeat(MAXBUF / 2);
        assert!(matches!(
            build_filter(&[half.clone(), half]),
            Err(InitProcessError::FilterTooLong { .. })
        ));
    }
}
