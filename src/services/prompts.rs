//! 提示词模板 - 业务能力层
//!
//! 固定的题目生成与判卷提示词。格式约定是解析器的输入契约：
//! 题目按每行一个 `{type=…, description=…, option=…, answer=…, explanation=…}`
//! 片段返回，判卷按单个 `{score=数字, reason="理由"}` 片段返回。

use crate::models::Question;

/// 构建题目生成提示词
///
/// 按 2:2:1 的比例分配选择、填空、简答三种题型（10 道题即 4/4/2）。
pub fn question_generation(subject: &str, count: usize) -> String {
    let choice_count = count * 2 / 5;
    let fill_count = count * 2 / 5;
    let open_count = count - choice_count - fill_count;

    format!(
        "请生成{count}道关于{subject}的题目，题目请不要过于简单，\
        比如不要出类似于啥传感器能检测压力（压力传感器）之类的问题，即看题干就能出答案的，\
        每道题目格式如下：{{type='', description='', option='', answer='', explanation=''}}。\
        其中包含{choice_count}个选择题，{fill_count}个填空题和{open_count}个简答题。\
        请确保题目内容明确、精确，避免多义性。\
        对于可能有多种答案的题目，请在题干中明确要求回答其中的一种，或指定特定的方向。\
        type为选择、填空、简答三选一，description为题目的描述，\
        option为选择题的四个选项格式为A:xxx，B:...，C:...，D:...，\
        填空和简答回复None即可，answer为题目的答案，选择题给出正确的选项（A-D），\
        填空题给出要填的答案，简答题给出答案，explanation为答案的解释。\n\
        请按以下格式一道一道地显示题目：\n\
        {{type=\"选择\", description=\"1+1=？\", option=\"A:1,B:2,C:3,D:4\", answer=\"B\", explanation=\"略\"}}\n\
        {{type=\"填空\", description=\"古诗补全：床前明月光，_______地上霜。\", option=\"None\", answer=\"疑是\", explanation=\"略\"}}\n\
        {{type=\"简答\", description=\"请说一说为什么压电晶体一压就会产生电？\", option=\"None\", answer=\"因为...\", explanation=\"略\"}}"
    )
}

/// 判卷的系统提示词
pub fn grading_system() -> &'static str {
    "你将扮演一位严格但公平的阅卷老师，\
    请根据以下的标准答案和评分标准，评估用户的回答。\
    满分为10分，请给出得分和简短的评分理由。\
    如果用户的答案部分正确，也应给予适当的分数。\
    请注意，答案不需要和标准答案一模一样，只要内容合理、正确即可得分。\
    但如果用户未作答或答案与题目无关，则得0分。\
    用户答案后面的内容才是用户的答案，也就是你要测评的内容。\
    请严格按照格式{score=数字, reason=\"理由\"}返回，不要有多余的内容。"
}

/// 构建判卷的用户消息
pub fn grading_user(question: &Question, user_answer: &str) -> String {
    format!(
        "问题：{}\n参考答案: {}\n用户答案：{}",
        question.description, question.answer, user_answer
    )
}
