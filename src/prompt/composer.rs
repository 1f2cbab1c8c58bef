use super::references::encode_references;
use super::style::StyleVariant;
use super::{GenerationRequest, PromptOptions};

/// Builds the instruction sent to the generative model.
///
/// Sections always appear in this order: role, input parameters, reference
/// documents, style structure, writing rules, output structure. The result
/// depends only on the request, the references and the options.
#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    options: PromptOptions,
}

impl PromptComposer {
    pub fn new(options: PromptOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PromptOptions {
        &self.options
    }

    pub fn compose(&self, request: &GenerationRequest, references: &[String]) -> String {
        [
            role_section(request, references.is_empty()),
            input_section(request),
            encode_references(references),
            style_section(request),
            rules_section(request, &self.options),
            output_section(&self.options),
            "[작성 시작]\n".to_string(),
        ]
        .join("\n")
    }
}

fn role_section(request: &GenerationRequest, no_references: bool) -> String {
    let mut out = String::from("당신은 치과 마케팅 전문 블로그 글쓰기 전문가입니다.\n");
    if no_references {
        out.push_str(&format!(
            "'{}' 원장님의 과거 글이 없으므로, 환자에게 친근하면서도 전문적인 일반 블로그 문체로 새 글을 작성해주세요.\n",
            request.author
        ));
    } else {
        out.push_str(&format!(
            "아래 [참고 문서]는 '{}' 원장님이 평소에 작성한 블로그 글들입니다.\n",
            request.author
        ));
        out.push_str(
            "이 원장님의 문체, 어조, 글의 구조, 자주 쓰는 표현 등 스타일을 분석하여 새로운 글을 작성해주세요.\n",
        );
    }
    out
}

fn input_section(request: &GenerationRequest) -> String {
    let mut out = String::from("[입력 정보]\n");
    out.push_str(&format!("- 작성자: {}\n", request.author));
    out.push_str(&format!("- 주제: {}\n", request.topic));
    out.push_str(&format!("- 핵심 키워드: {}\n", request.keyword));
    out.push_str(&format!("- 글 스타일: {}\n", request.style.label()));
    if let Some(note) = request.context_note() {
        if !request.style.accepts_episode() {
            out.push_str(&format!("- 추가 참고 사항: {}\n", note));
        }
    }
    out
}

fn style_section(request: &GenerationRequest) -> String {
    let mut out = format!("{}\n", request.style.marker());
    match request.style {
        StyleVariant::Standard => {
            out.push_str("- 정보 전달과 공감의 균형을 맞춘 구성으로 작성하세요.\n");
            out.push_str("- 서론에서 독자가 겪는 고민을 제시하고, 본론에서 원인·치료 과정·관리 방법을 차례로 설명하세요.\n");
            out.push_str("- 소제목을 활용해 단락마다 한 가지 정보만 다루세요.\n");
        }
        StyleVariant::Story => {
            out.push_str("- 글의 도입부를 구체적인 환자 한 분의 사연으로 시작하세요.\n");
            out.push_str("- 사연 → 진단 → 치료 과정 → 변화된 일상 순서의 이야기 흐름을 유지하세요.\n");
            match request.context_note() {
                Some(episode) => {
                    out.push_str("- 아래 [실제 환자 에피소드]를 바탕으로 사연을 구성하고, 사실을 과장하거나 지어내지 마세요.\n");
                    out.push_str("- 환자를 특정할 수 있는 개인정보는 일반화해서 표현하세요.\n");
                    out.push_str(&format!("[실제 환자 에피소드]\n{}\n", episode));
                }
                None => {
                    out.push_str("- 실제 에피소드가 제공되지 않았으므로, 주제에 맞는 전형적인 환자 사례를 예시임을 밝히고 구성하세요.\n");
                }
            }
        }
        StyleVariant::Faq => {
            out.push_str("- 환자들이 실제로 자주 묻는 질문 정확히 3개를 골라 질문과 답변 쌍으로 구성하세요.\n");
            out.push_str("- 각 질문은 'Q.'로, 답변은 'A.'로 시작하세요.\n");
            out.push_str("- 질문 3개 외에 다른 질문을 추가하지 마세요.\n");
        }
        StyleVariant::MythBust => {
            out.push_str("- 주제에 대해 사람들이 흔히 믿는 도발적인 오해 하나로 글을 시작하세요.\n");
            out.push_str("- '오해'와 '사실'을 짝지어 제시하고, 사실 부분에서 근거를 차분히 설명하세요.\n");
            out.push_str("- 독자를 비난하지 말고, 오해가 생긴 이유에 공감한 뒤 바로잡으세요.\n");
        }
    }
    out
}

fn rules_section(request: &GenerationRequest, options: &PromptOptions) -> String {
    let mut out = String::from("[작성 규칙]\n");
    out.push_str("1. 문체: [참고 문서]의 스타일을 따르되, 너무 딱딱하지 않고 환자에게 친근감을 주도록 하세요.\n");
    out.push_str(&format!(
        "2. 핵심 키워드 '{}'를 글 전체에 자연스럽게 {}회 이상 녹여내세요.\n",
        request.keyword, options.min_keyword_count
    ));
    out.push_str("3. 네이버 블로그 포맷팅 (모바일 가독성 최우선):\n");
    out.push_str("   - 한 줄은 20~30자 내외로 짧게 끊어서 줄바꿈을 넣으세요.\n");
    out.push_str("   - 문장 단위가 아니라 호흡 단위로 줄바꿈을 자주 하세요.\n");
    out.push_str("   - 문단 사이에는 반드시 빈 줄을 넣어 여백을 확보하세요.\n");
    out.push_str("4. 이미지 추천: 이미지가 들어가면 좋은 위치에 [이미지: 넣을 사진에 대한 구체적인 묘사] 형식으로 표시하세요.\n");
    out.push_str("5. 의료광고 준수 사항 (반드시 지킬 것):\n");
    out.push_str("   - '최고', '최초', '유일', '100%', '완벽', '무통' 같은 절대적·최상급 표현을 쓰지 마세요.\n");
    out.push_str("   - 다른 치과나 의료기관과 비교하거나 비방하는 표현을 쓰지 마세요.\n");
    out.push_str("   - 치료 효과는 개인에 따라 차이가 있을 수 있다는 점을 명시하세요.\n");
    out.push_str("   - 시술 후 부작용(예: 통증, 붓기, 출혈 등)이 나타날 수 있다는 점을 명시하세요.\n");
    out
}

fn output_section(options: &PromptOptions) -> String {
    let mut out = String::from("[출력 형식]\n");
    out.push_str("- 제목\n");
    out.push_str("- 서론 (인사말 및 문제 제기)\n");
    out.push_str("- 본론 (선택한 구성 방식에 따른 전개)\n");
    out.push_str("- 결론 (요약 및 내원 유도)\n");
    out.push_str("- 부작용 및 개인차 안내 문구\n");
    out.push_str(&format!("- 해시태그 ({}개 이상)\n", options.hashtag_count));
    out
}
