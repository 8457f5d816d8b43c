/// 文字處理階段。每個階段都是純函式，不得失敗
pub trait TextStage: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, text: &str) -> String;
}
